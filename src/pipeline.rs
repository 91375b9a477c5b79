//! One collect-merge-persist cycle for a single source.
//!
//! ```text
//! run_queries ──▶ accumulate ──▶ merge_and_persist
//!   (HTTP)          (pure)         (load / clean / save)
//! ```
//!
//! When no query produced any record the merge is skipped entirely and the
//! dataset on disk is left untouched.

use crate::accumulate::{accumulate, QueryFailure};
use crate::config::SourceConfig;
use crate::error::DatasetError;
use crate::merge::{merge_and_persist, MergeReport};
use crate::query::run_queries;
use reqwest::Client;
use tracing::{info, instrument, warn};

/// What a run did.
#[derive(Debug)]
pub enum RunReport {
    /// Nothing was collected, so nothing was written.
    NoNewArticles { failures: Vec<QueryFailure> },
    /// New records were merged into the dataset file.
    Merged {
        fetched_queries: usize,
        collected: usize,
        failures: Vec<QueryFailure>,
        merge: MergeReport,
    },
}

impl RunReport {
    pub fn failures(&self) -> &[QueryFailure] {
        match self {
            RunReport::NoNewArticles { failures } | RunReport::Merged { failures, .. } => failures,
        }
    }
}

#[instrument(level = "info", skip_all, fields(source = %source.kind, output = %source.output_path.display()))]
pub async fn collect(client: &Client, source: &SourceConfig) -> Result<RunReport, DatasetError> {
    let outcomes = run_queries(client, source).await;
    let acc = accumulate(outcomes);

    for failure in &acc.failures {
        warn!(query = %failure.query, error = %failure.error, "Query contributed no articles");
    }

    if acc.is_empty() {
        info!("No new articles collected from {}.", source.kind);
        return Ok(RunReport::NoNewArticles {
            failures: acc.failures,
        });
    }

    let collected = acc.dataset.len();
    info!(collected, "Collected new articles");

    let merge = merge_and_persist(
        &source.output_path,
        acc.dataset,
        &source.key_column,
        &source.required_columns,
    )
    .await?;

    info!(
        total = merge.total_rows,
        added = merge.added(),
        "Data combined and cleaned. Total articles after combining: {}",
        merge.total_rows
    );

    Ok(RunReport::Merged {
        fetched_queries: acc.fetched_queries,
        collected,
        failures: acc.failures,
        merge,
    })
}
