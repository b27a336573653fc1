//! Dashboard configuration.
//!
//! Read from TOML. Every field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! [api]
//! base_url = "https://tablero.example.gob.pe/api"
//! timeout_secs = 20
//!
//! [table]
//! page_size = 10
//! fetch_page_size = 20
//!
//! [policies.kpis]
//! max_retries = 1
//! stale_time_ms = 180000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tablero_core::logging::targets;
use tablero_net::{HttpClient, NetworkError, RestApiClient};
use thiserror::Error;

use crate::query::FetchPolicy;

/// Errors raised while loading or applying a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML did not parse into a configuration.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range.
    #[error("invalid configuration value `{field}`: {reason}")]
    Invalid {
        /// Dotted field name.
        field: &'static str,
        /// What is wrong.
        reason: String,
    },

    /// The HTTP client could not be built from the configuration.
    #[error("failed to build API client: {0}")]
    Client(#[from] NetworkError),
}

/// Connection to the REST API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Token sent as `Authorization: Bearer`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 30,
            bearer_token: None,
        }
    }
}

/// Table sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Rows per page in the table engine.
    pub page_size: usize,
    /// Rows per server page requested from table endpoints.
    pub fetch_page_size: u32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: crate::table::DEFAULT_PAGE_SIZE,
            fetch_page_size: 20,
        }
    }
}

/// Fetch policies per panel kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Headline indicators.
    pub kpis: FetchPolicy,
    /// Chart series.
    pub charts: FetchPolicy,
    /// Table pages.
    pub table: FetchPolicy,
    /// Reference data.
    pub master_data: FetchPolicy,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            kpis: FetchPolicy::kpis(),
            charts: FetchPolicy::dashboard(),
            table: FetchPolicy::dashboard(),
            master_data: FetchPolicy::master_data(),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// REST API connection.
    pub api: ApiConfig,
    /// Table sizing.
    pub table: TableConfig,
    /// Fetch policies.
    pub policies: PolicyConfig,
}

impl DashboardConfig {
    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "api.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.table.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "table.page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.table.fetch_page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "table.fetch_page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Build the REST client for [`ApiSource`](crate::api::ApiSource).
    ///
    /// The client sends each request once; the fetch policies own retry.
    pub fn rest_client(&self) -> Result<RestApiClient, ConfigError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(self.api.timeout_secs))
            .build()?;
        let mut builder = RestApiClient::builder(self.api.base_url.as_str())
            .http_client(http)
            .json_api();
        if let Some(token) = &self.api.bearer_token {
            builder = builder.bearer_auth(token.clone());
        }
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::BackoffStrategy;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.table.page_size, 10);
        assert_eq!(config.table.fetch_page_size, 20);
        assert_eq!(config.policies.kpis, FetchPolicy::kpis());
    }

    #[test]
    fn test_partial_document() {
        let config = DashboardConfig::from_toml_str(
            r#"
            [api]
            base_url = "https://example.org/api"
            bearer_token = "abc"

            [policies.charts]
            max_retries = 0
            backoff = { kind = "none" }
            "#,
        )
        .unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.api.bearer_token.as_deref(), Some("abc"));
        assert_eq!(config.policies.charts.max_retries, 0);
        assert_eq!(config.policies.charts.backoff, BackoffStrategy::None);
        assert_eq!(config.policies.table, FetchPolicy::dashboard());
    }

    #[test]
    fn test_validation() {
        let err = DashboardConfig::from_toml_str("[table]\npage_size = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "table.page_size",
                ..
            }
        ));

        let err = DashboardConfig::from_toml_str("[api]\nbase_url = \"\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "api.base_url", .. }));

        assert!(matches!(
            DashboardConfig::from_toml_str("[table]\npage_size = \"ten\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip_preserves_policies() {
        let mut config = DashboardConfig::default();
        config.policies.kpis = FetchPolicy::kpis().with_max_retries(4);
        let text = config.to_toml_string().unwrap();
        assert_eq!(DashboardConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rest_client_uses_base_url() {
        let config = DashboardConfig::from_toml_str("[api]\nbase_url = \"http://localhost:9000/api/\"")
            .unwrap();
        let client = config.rest_client().unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/api");
        assert_eq!(client.http_client().config().timeout, Some(Duration::from_secs(30)));
    }
}
