//! Command-line interface definitions for the news collector.
//!
//! Every flag is optional; with no `--source` both sources run. Values given here take
//! precedence over the YAML config file, which in turn overrides the
//! built-in defaults for each source.

use crate::config::{Overrides, SourceKind};
use clap::Parser;
use std::path::PathBuf;

/// Value of `--source`: one source, or every source in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceSelection {
    /// GDELT DOC 2.0 article search
    Gdelt,
    /// NewsAPI `/v2/everything`
    Newsapi,
    /// GDELT, then NewsAPI
    All,
}

impl SourceSelection {
    fn kinds(self) -> &'static [SourceKind] {
        match self {
            SourceSelection::Gdelt => &[SourceKind::Gdelt],
            SourceSelection::Newsapi => &[SourceKind::NewsApi],
            SourceSelection::All => &[SourceKind::Gdelt, SourceKind::NewsApi],
        }
    }
}

/// Command-line arguments for the news collector.
///
/// # Examples
///
/// ```sh
/// # Collect from GDELT into the default dataset file
/// news_collector --source gdelt
///
/// # Both sources (same as `-s all`), NewsAPI key from the environment
/// NEWSAPI_KEY=... news_collector
///
/// # Custom queries and output location
/// news_collector -s newsapi -q "Trump rally protest" -o data/newsapi.csv
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Source(s) to collect from; repeat to run several in sequence
    #[arg(short, long = "source", value_enum, default_values_t = [SourceSelection::All])]
    pub sources: Vec<SourceSelection>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dataset CSV path (only with a single --source)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Search query; repeat to replace the built-in query list
    #[arg(short, long = "query")]
    pub queries: Vec<String>,

    /// NewsAPI key
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub newsapi_key: Option<String>,

    /// Per-request timeout in seconds (default: none)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl Cli {
    /// Selected sources in command-line order, `all` expanded, without repeats.
    pub fn selected_sources(&self) -> Vec<SourceKind> {
        let mut kinds = Vec::new();
        for kind in self.sources.iter().flat_map(|s| s.kinds()) {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        kinds
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            output: self.output.clone(),
            queries: self.queries.clone(),
            newsapi_key: self.newsapi_key.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}
