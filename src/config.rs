//! Per-source pipeline configuration.
//!
//! Each run is driven by a [`SourceConfig`] built from three layers, lowest
//! precedence first:
//!
//! 1. Built-in defaults for the [`SourceKind`] (endpoint, fixed request
//!    parameters, query list, output path)
//! 2. An optional YAML file ([`FileConfig`]) with `gdelt:` / `newsapi:` sections
//! 3. Command-line flags and environment variables ([`Overrides`])
//!
//! # Example
//!
//! ```yaml
//! gdelt:
//!   output_path: data/gdelt.csv
//!   params:
//!     maxrecords: 100
//! newsapi:
//!   api_key: 0123456789abcdef
//!   queries:
//!     - Trump rally protest
//!   timeout_secs: 30
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

/// Search queries issued against both sources unless overridden.
pub const DEFAULT_QUERIES: &[&str] = &[
    "Trump shooting rally",
    "Trump assassination attempt",
    "Trump Pennsylvania rally 2024",
    "Trump July 2024 news",
    "Trump rally protest",
    "Trump Pennsylvania news",
    "Trump July 2024 incident",
    "Trump rally media coverage",
    "Trump security breach",
    "Trump rally attack",
    "Trump rally 2024 analysis",
    "Trump rally response 2024",
];

/// Column that identifies an article across runs.
pub const KEY_COLUMN: &str = "url";

/// Columns every persisted row must have.
pub const REQUIRED_COLUMNS: &[&str] = &["url", "title", "content"];

/// The external search API a pipeline talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// GDELT DOC 2.0 article search
    Gdelt,
    /// NewsAPI `/v2/everything`
    NewsApi,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Gdelt => "GDELT",
            SourceKind::NewsApi => "NewsAPI",
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            SourceKind::Gdelt => "https://api.gdeltproject.org/api/v2/doc/doc",
            SourceKind::NewsApi => "https://newsapi.org/v2/everything",
        }
    }

    /// Name of the request parameter carrying the search string.
    pub fn query_param(self) -> &'static str {
        match self {
            SourceKind::Gdelt => "query",
            SourceKind::NewsApi => "q",
        }
    }

    /// Name of the request parameter carrying the credential, if any.
    pub fn api_key_param(self) -> Option<&'static str> {
        match self {
            SourceKind::Gdelt => None,
            SourceKind::NewsApi => Some("apiKey"),
        }
    }

    pub fn default_params(self) -> Vec<(String, String)> {
        let params: &[(&str, &str)] = match self {
            SourceKind::Gdelt => &[("mode", "ArtList"), ("maxrecords", "250"), ("format", "json")],
            SourceKind::NewsApi => &[("pageSize", "100"), ("language", "en")],
        };
        params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn default_output_path(self) -> &'static str {
        match self {
            SourceKind::Gdelt => "combined_trump_data_cleaned.csv",
            SourceKind::NewsApi => "combined_trump_newsapi_data.csv",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything one pipeline run needs. Built once, then passed by reference.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub endpoint: Url,
    pub queries: Vec<String>,
    pub output_path: PathBuf,
    /// Fixed request parameters sent with every query.
    pub params: Vec<(String, String)>,
    pub api_key: Option<String>,
    pub key_column: String,
    pub required_columns: Vec<String>,
    /// Per-request timeout. `None` leaves the HTTP client's default in place.
    pub timeout: Option<Duration>,
}

impl SourceConfig {
    /// Resolve the configuration for `kind` from the file section (if any)
    /// and command-line overrides, then validate it.
    pub fn resolve(
        kind: SourceKind,
        file: Option<&SourceSettings>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let file = file.cloned().unwrap_or_default();

        let endpoint_str = file
            .endpoint
            .unwrap_or_else(|| kind.default_endpoint().to_string());
        let endpoint = Url::parse(&endpoint_str).map_err(|reason| ConfigError::Endpoint {
            kind,
            url: endpoint_str.clone(),
            reason,
        })?;

        let mut params = kind.default_params();
        for (name, value) in file.params.unwrap_or_default() {
            let value = yaml_scalar(&value).ok_or_else(|| ConfigError::Param {
                kind,
                name: name.clone(),
            })?;
            match params.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value,
                None => params.push((name, value)),
            }
        }

        let queries = if !overrides.queries.is_empty() {
            overrides.queries.clone()
        } else if let Some(queries) = file.queries {
            queries
        } else {
            DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect()
        };

        let output_path = overrides
            .output
            .clone()
            .or(file.output_path)
            .unwrap_or_else(|| PathBuf::from(kind.default_output_path()));

        let api_key = match kind {
            SourceKind::NewsApi => overrides.newsapi_key.clone().or(file.api_key),
            SourceKind::Gdelt => file.api_key,
        }
        .filter(|k| !k.trim().is_empty());

        let required_columns = file
            .required_columns
            .unwrap_or_else(|| REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect());

        let timeout = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs);

        let config = Self {
            kind,
            endpoint,
            queries,
            output_path,
            params,
            api_key,
            key_column: KEY_COLUMN.to_string(),
            required_columns,
            timeout,
        };
        config.validate()?;
        debug!(?config.kind, queries = config.queries.len(), output = %config.output_path.display(), "Resolved source config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.queries.is_empty() {
            return Err(ConfigError::NoQueries { kind: self.kind });
        }
        if let Some(index) = self.queries.iter().position(|q| q.trim().is_empty()) {
            return Err(ConfigError::BlankQuery {
                kind: self.kind,
                index,
            });
        }
        if self.kind.api_key_param().is_some() && self.api_key.is_none() {
            return Err(ConfigError::MissingApiKey { kind: self.kind });
        }
        Ok(())
    }

    /// Query-string parameters for one search: the query itself, the fixed
    /// parameters, then the credential.
    pub fn request_params<'a>(&'a self, query: &'a str) -> Vec<(&'a str, &'a str)> {
        let mut params = Vec::with_capacity(self.params.len() + 2);
        params.push((self.kind.query_param(), query));
        params.extend(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let (Some(name), Some(key)) = (self.kind.api_key_param(), self.api_key.as_deref()) {
            params.push((name, key));
        }
        params
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub queries: Vec<String>,
    pub newsapi_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// One source's section of the YAML config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSettings {
    pub endpoint: Option<String>,
    pub queries: Option<Vec<String>>,
    pub output_path: Option<PathBuf>,
    /// Merged over the built-in parameters; same-named entries replace them.
    pub params: Option<BTreeMap<String, serde_yaml::Value>>,
    pub api_key: Option<String>,
    pub required_columns: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

/// Top-level YAML config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub gdelt: Option<SourceSettings>,
    pub newsapi: Option<SourceSettings>,
}

impl FileConfig {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration file");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn section(&self, kind: SourceKind) -> Option<&SourceSettings> {
        match kind {
            SourceKind::Gdelt => self.gdelt.as_ref(),
            SourceKind::NewsApi => self.newsapi.as_ref(),
        }
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key() -> Overrides {
        Overrides {
            newsapi_key: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_gdelt_defaults() {
        let config = SourceConfig::resolve(SourceKind::Gdelt, None, &Overrides::default()).unwrap();

        assert_eq!(config.endpoint.as_str(), "https://api.gdeltproject.org/api/v2/doc/doc");
        assert_eq!(config.queries.len(), 12);
        assert_eq!(config.output_path, PathBuf::from("combined_trump_data_cleaned.csv"));
        assert_eq!(config.required_columns, ["url", "title", "content"]);
        assert!(config.timeout.is_none());
        assert_eq!(
            config.request_params("Trump rally protest"),
            vec![
                ("query", "Trump rally protest"),
                ("mode", "ArtList"),
                ("maxrecords", "250"),
                ("format", "json"),
            ]
        );
    }

    #[test]
    fn test_newsapi_params_include_key() {
        let config = SourceConfig::resolve(SourceKind::NewsApi, None, &with_key()).unwrap();
        assert_eq!(
            config.request_params("Trump security breach"),
            vec![
                ("q", "Trump security breach"),
                ("pageSize", "100"),
                ("language", "en"),
                ("apiKey", "secret"),
            ]
        );
    }

    #[test]
    fn test_newsapi_requires_key() {
        let err = SourceConfig::resolve(SourceKind::NewsApi, None, &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { kind: SourceKind::NewsApi }));

        let blank = Overrides {
            newsapi_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(SourceConfig::resolve(SourceKind::NewsApi, None, &blank).is_err());
    }

    #[test]
    fn test_blank_query_rejected() {
        let overrides = Overrides {
            queries: vec!["Trump rally".to_string(), " ".to_string()],
            ..Default::default()
        };
        let err = SourceConfig::resolve(SourceKind::Gdelt, None, &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::BlankQuery { index: 1, .. }));
    }

    #[test]
    fn test_empty_query_list_rejected() {
        let file = SourceSettings {
            queries: Some(vec![]),
            ..Default::default()
        };
        let err = SourceConfig::resolve(SourceKind::Gdelt, Some(&file), &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NoQueries { .. }));
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let file = SourceSettings {
            endpoint: Some("not a url".to_string()),
            ..Default::default()
        };
        let err = SourceConfig::resolve(SourceKind::Gdelt, Some(&file), &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Endpoint { .. }));
    }

    #[test]
    fn test_file_then_cli_precedence() {
        let file = FileConfig::parse(
            r#"
newsapi:
  api_key: from-file
  output_path: data/newsapi.csv
  queries: [one, two]
  timeout_secs: 10
  params:
    pageSize: 20
    sortBy: publishedAt
"#,
        )
        .unwrap();
        let section = file.section(SourceKind::NewsApi);

        let from_file = SourceConfig::resolve(SourceKind::NewsApi, section, &Overrides::default()).unwrap();
        assert_eq!(from_file.api_key.as_deref(), Some("from-file"));
        assert_eq!(from_file.output_path, PathBuf::from("data/newsapi.csv"));
        assert_eq!(from_file.queries, ["one", "two"]);
        assert_eq!(from_file.timeout, Some(Duration::from_secs(10)));
        assert_eq!(
            from_file.params,
            vec![
                ("pageSize".to_string(), "20".to_string()),
                ("language".to_string(), "en".to_string()),
                ("sortBy".to_string(), "publishedAt".to_string()),
            ]
        );

        let overrides = Overrides {
            output: Some(PathBuf::from("cli.csv")),
            queries: vec!["three".to_string()],
            newsapi_key: Some("from-cli".to_string()),
            timeout_secs: Some(5),
        };
        let from_cli = SourceConfig::resolve(SourceKind::NewsApi, section, &overrides).unwrap();
        assert_eq!(from_cli.api_key.as_deref(), Some("from-cli"));
        assert_eq!(from_cli.output_path, PathBuf::from("cli.csv"));
        assert_eq!(from_cli.queries, ["three"]);
        assert_eq!(from_cli.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_file_config_rejects_unknown_fields() {
        assert!(FileConfig::parse("gdelt:\n  endpoints: x\n").is_err());
        assert!(FileConfig::parse("bing: {}\n").is_err());
    }

    #[test]
    fn test_empty_file_config() {
        let file = FileConfig::parse("").unwrap();
        assert!(file.gdelt.is_none());
        assert!(file.newsapi.is_none());
    }

    #[test]
    fn test_non_scalar_param_rejected() {
        let file = FileConfig::parse("gdelt:\n  params:\n    mode: [a, b]\n").unwrap();
        let err = SourceConfig::resolve(SourceKind::Gdelt, file.section(SourceKind::Gdelt), &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Param { .. }));
    }

    #[tokio::test]
    async fn test_load_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::load(&dir.path().join("nope.yaml")).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
