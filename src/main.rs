//! # News Collector
//!
//! Collects news articles matching a list of search queries from the GDELT
//! DOC API and NewsAPI, merges them into a per-source CSV dataset, and
//! removes duplicate and incomplete rows.
//!
//! ## Usage
//!
//! ```sh
//! news_collector --source gdelt
//! NEWSAPI_KEY=... news_collector --source newsapi --output data/newsapi.csv
//! ```
//!
//! ## Architecture
//!
//! Each selected source runs the same pipeline, one after another:
//! 1. **Query**: one GET per search query, failures logged and skipped
//! 2. **Accumulate**: concatenate every query's articles in order
//! 3. **Merge**: load the existing CSV, drop duplicate URLs (existing rows
//!    win), drop rows missing `url`, `title` or `content`, overwrite the file

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use news_collector::cli::Cli;
use news_collector::config::{FileConfig, SourceConfig};
use news_collector::error::ConfigError;
use news_collector::pipeline::{self, RunReport};
use news_collector::query;
use news_collector::utils::check_output_location;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_collector starting up");

    let args = Cli::parse();
    debug!(?args.sources, ?args.config, ?args.output, "Parsed CLI arguments");

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path).await?,
        None => FileConfig::default(),
    };

    // Resolve every selected source up front so a config mistake fails
    // before any request is sent.
    let kinds = args.selected_sources();
    if args.output.is_some() && kinds.len() > 1 {
        return Err(ConfigError::AmbiguousOutput.into());
    }
    let overrides = args.overrides();
    let sources = kinds
        .iter()
        .map(|&kind| SourceConfig::resolve(kind, file_config.section(kind), &overrides))
        .collect::<Result<Vec<_>, _>>()?;

    for source in &sources {
        if let Err(e) = check_output_location(&source.output_path).await {
            error!(
                path = %source.output_path.display(),
                error = %e,
                "Dataset directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let mut fatal: Vec<String> = Vec::new();
    for source in &sources {
        match run_source(source).await {
            Ok(report) => log_report(source, &report),
            Err(e) => {
                error!(source = %source.kind, error = %e, "Collection run failed");
                fatal.push(format!("{}: {e}", source.kind));
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    if fatal.is_empty() {
        Ok(())
    } else {
        Err(fatal.join("; ").into())
    }
}

async fn run_source(source: &SourceConfig) -> Result<RunReport, Box<dyn Error>> {
    let client = query::build_client(source)?;
    Ok(pipeline::collect(&client, source).await?)
}

fn log_report(source: &SourceConfig, report: &RunReport) {
    match report {
        RunReport::NoNewArticles { failures } => {
            info!(
                source = %source.kind,
                failed_queries = failures.len(),
                "Run finished without writing"
            );
        }
        RunReport::Merged {
            fetched_queries,
            collected,
            failures,
            merge,
        } => {
            info!(
                source = %source.kind,
                path = %source.output_path.display(),
                fetched_queries,
                failed_queries = failures.len(),
                collected,
                added = merge.added(),
                total = merge.total_rows,
                "Run finished"
            );
        }
    }
}
