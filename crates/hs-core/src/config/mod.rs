//! # Configuration DTO
//!
//! Maps the TOML configuration file onto [`AppConfig`]. This module holds data
//! only: no validation and no defaults beyond "empty". Adapters validate the
//! values they need once, when they are constructed.

use std::path::PathBuf;

/// Application configuration (pure data).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Address the HTTP server binds to, e.g. `127.0.0.1:8080`.
    pub bind_address: String,

    /// Directory for logs and local state (path only, no existence check).
    pub data_dir: PathBuf,

    /// Search backend name: `algolia` or `memory`. Empty means "not chosen".
    pub search_backend: String,

    pub algolia_app_id: String,
    pub algolia_admin_api_key: String,
    /// Overrides the `{app_id}.algolia.net` host; mostly for tests.
    pub algolia_host: String,
    /// Process-wide default index name. Empty means no default.
    pub default_index: String,
    /// Per-request timeout in seconds; 0 means "not set".
    pub search_timeout_secs: u64,

    pub marketplace_api_base_url: String,
    pub integration_client_id: String,
    pub integration_client_secret: String,
}

fn str_at<'a>(value: &'a toml::Value, table: &str, key: &str) -> &'a str {
    value
        .get(table)
        .and_then(|t| t.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

impl AppConfig {
    /// Create AppConfig from a TOML value.
    ///
    /// Missing keys become empty values; they are facts, not errors.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        Ok(Self {
            bind_address: str_at(toml_value, "server", "bind_address").to_string(),
            data_dir: PathBuf::from(str_at(toml_value, "storage", "data_dir")),
            search_backend: str_at(toml_value, "search", "backend").to_string(),
            algolia_app_id: str_at(toml_value, "search", "app_id").to_string(),
            algolia_admin_api_key: str_at(toml_value, "search", "admin_api_key").to_string(),
            algolia_host: str_at(toml_value, "search", "host").to_string(),
            default_index: str_at(toml_value, "search", "default_index").to_string(),
            search_timeout_secs: toml_value
                .get("search")
                .and_then(|s| s.get("timeout_secs"))
                .and_then(|v| v.as_integer())
                .unwrap_or(0)
                .max(0) as u64,
            marketplace_api_base_url: str_at(toml_value, "marketplace", "api_base_url")
                .to_string(),
            integration_client_id: str_at(toml_value, "marketplace", "integration_client_id")
                .to_string(),
            integration_client_secret: str_at(
                toml_value,
                "marketplace",
                "integration_client_secret",
            )
            .to_string(),
        })
    }

    /// Create an AppConfig with every field empty.
    pub fn empty() -> Self {
        Self {
            bind_address: String::new(),
            data_dir: PathBuf::new(),
            search_backend: String::new(),
            algolia_app_id: String::new(),
            algolia_admin_api_key: String::new(),
            algolia_host: String::new(),
            default_index: String::new(),
            search_timeout_secs: 0,
            marketplace_api_base_url: String::new(),
            integration_client_id: String::new(),
            integration_client_secret: String::new(),
        }
    }

    /// Empty config rooted at `data_dir`.
    ///
    /// The caller computes the directory (e.g. with the `dirs` crate).
    pub fn with_system_defaults(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Self::empty()
        }
    }
}

/// Raised by adapters when a configuration value they need is missing or unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}
