//! Error types for the collector.
//!
//! Per-query failures ([`FetchError`]) are recovered by the query runner and
//! reported alongside the results. Dataset and configuration errors are fatal
//! and bubble up to `main`.

use crate::config::SourceKind;
use std::path::PathBuf;

/// Why a single search query produced no records.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The endpoint answered with a non-2xx status.
    #[error("HTTP status {status} (body: {body})")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Connection, TLS, timeout or body-read failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The body was not valid JSON.
    #[error("invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure reading or writing the persisted dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path:?}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

impl DatasetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Invalid or unreadable configuration. Raised before any request is sent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("{kind}: invalid endpoint URL {url:?}: {reason}")]
    Endpoint {
        kind: SourceKind,
        url: String,
        reason: url::ParseError,
    },

    #[error("{kind}: query list is empty")]
    NoQueries { kind: SourceKind },

    #[error("{kind}: query #{index} is blank")]
    BlankQuery { kind: SourceKind, index: usize },

    #[error("{kind}: an API key is required (use --newsapi-key or NEWSAPI_KEY)")]
    MissingApiKey { kind: SourceKind },

    #[error("{kind}: parameter {name:?} must be a string, number or boolean")]
    Param { kind: SourceKind, name: String },

    #[error("--output can only be used when a single source is selected")]
    AmbiguousOutput,
}
