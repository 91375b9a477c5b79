//! Query runner: one search request per configured query.
//!
//! Both sources share the same contract. A GET with the query and the
//! source's fixed parameters, a JSON body, and an optional `articles` array
//! whose objects become [`ArticleRecord`]s.
//!
//! Failures never abort the batch. Each query yields a [`QueryOutcome`], and
//! a failed query is logged with its query string and contributes no records.
//! Queries are issued one after another with no retry.

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::models::ArticleRecord;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

/// Result of a single search query.
#[derive(Debug)]
pub enum QueryOutcome {
    /// The request succeeded. `records` is empty when the body had no
    /// `articles` array.
    Fetched {
        query: String,
        records: Vec<ArticleRecord>,
    },
    /// The request or its decoding failed.
    Failed { query: String, error: FetchError },
}

impl QueryOutcome {
    pub fn query(&self) -> &str {
        match self {
            QueryOutcome::Fetched { query, .. } | QueryOutcome::Failed { query, .. } => query,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed { .. })
    }
}

/// HTTP client for one source, honoring its configured timeout.
pub fn build_client(source: &SourceConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = source.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Run every configured query in order, one request in flight at a time.
#[instrument(level = "info", skip_all, fields(source = %source.kind))]
pub async fn run_queries(client: &Client, source: &SourceConfig) -> Vec<QueryOutcome> {
    let outcomes: Vec<QueryOutcome> = stream::iter(source.queries.iter())
        .then(|query| run_query(client, source, query))
        .collect()
        .await;

    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    info!(
        queries = outcomes.len(),
        failed,
        "Finished querying {}",
        source.kind
    );
    outcomes
}

/// Issue one search and classify the result.
#[instrument(level = "info", skip_all, fields(source = %source.kind, %query))]
pub async fn run_query(client: &Client, source: &SourceConfig, query: &str) -> QueryOutcome {
    match fetch_articles(client, source, query).await {
        Ok(records) => {
            info!(count = records.len(), %query, "Fetched articles");
            QueryOutcome::Fetched {
                query: query.to_string(),
                records,
            }
        }
        Err(e) => {
            error!(error = %e, %query, "Query failed; skipping");
            QueryOutcome::Failed {
                query: query.to_string(),
                error: e,
            }
        }
    }
}

async fn fetch_articles(
    client: &Client,
    source: &SourceConfig,
    query: &str,
) -> Result<Vec<ArticleRecord>, FetchError> {
    let response = client
        .get(source.endpoint.clone())
        .query(&source.request_params(query))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    debug!(%status, bytes = body.len(), "Received response");

    if !status.is_success() {
        return Err(FetchError::Status {
            status,
            body: truncate_for_log(&body, 300),
        });
    }

    let json: Value = serde_json::from_str(&body)?;
    Ok(extract_articles(&json))
}

/// Pull article objects out of a decoded response body.
///
/// Anything other than an `articles` array (missing key, `null`, wrong type)
/// yields no records; non-object array elements are skipped.
pub fn extract_articles(body: &Value) -> Vec<ArticleRecord> {
    match body.get("articles") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(ArticleRecord::from_json_object)
            .collect(),
        _ => Vec::new(),
    }
}
