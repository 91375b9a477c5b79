//! Accumulator: fold per-query outcomes into one ordered dataset.

use crate::dataset::Dataset;
use crate::error::FetchError;
use crate::query::QueryOutcome;

/// A query that produced no records because its request failed.
#[derive(Debug)]
pub struct QueryFailure {
    pub query: String,
    pub error: FetchError,
}

/// Everything one source's queries produced.
#[derive(Debug, Default)]
pub struct Accumulated {
    /// Records from successful queries, in query order then response order.
    pub dataset: Dataset,
    /// Number of queries that returned a response, including empty ones.
    pub fetched_queries: usize,
    pub failures: Vec<QueryFailure>,
}

impl Accumulated {
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }
}

/// Concatenate the records of all successful queries. No I/O.
pub fn accumulate(outcomes: impl IntoIterator<Item = QueryOutcome>) -> Accumulated {
    let mut acc = Accumulated::default();
    for outcome in outcomes {
        match outcome {
            QueryOutcome::Fetched { records, .. } => {
                acc.fetched_queries += 1;
                acc.dataset.extend(records);
            }
            QueryOutcome::Failed { query, error } => {
                acc.failures.push(QueryFailure { query, error });
            }
        }
    }
    acc
}
