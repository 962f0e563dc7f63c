//! # Configuration Loader
//!
//! Reads the TOML file into [`AppConfig`] and overlays environment variables.
//! Pure data loading: values are not validated here. Adapters check what they
//! need when they are constructed.

use std::path::PathBuf;

use anyhow::Context;
use hs_core::config::AppConfig;

/// Load configuration from a TOML file.
///
/// Missing sections and keys become empty values.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: PathBuf) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    AppConfig::from_toml(&toml_value)
}

/// Load the file when one is given, otherwise start from an empty config
/// rooted at the platform data directory. Environment variables are applied
/// on top in both cases.
pub fn resolve_config(config_path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => AppConfig::with_system_defaults(hs_infra::fs::app_data_dir()?),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Overlay environment values onto `config`. Blank values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let string_fields: [(&str, &mut String); 9] = [
        ("HOMESTEAD_BIND", &mut config.bind_address),
        ("HOMESTEAD_SEARCH_BACKEND", &mut config.search_backend),
        ("ALGOLIA_APP_ID", &mut config.algolia_app_id),
        ("ALGOLIA_ADMIN_API_KEY", &mut config.algolia_admin_api_key),
        ("ALGOLIA_HOST", &mut config.algolia_host),
        ("ALGOLIA_DEFAULT_INDEX", &mut config.default_index),
        ("MARKETPLACE_API_BASE_URL", &mut config.marketplace_api_base_url),
        ("MARKETPLACE_INTEGRATION_CLIENT_ID", &mut config.integration_client_id),
        (
            "MARKETPLACE_INTEGRATION_CLIENT_SECRET",
            &mut config.integration_client_secret,
        ),
    ];
    for (key, field) in string_fields {
        if let Some(value) = get(key) {
            *field = value;
        }
    }

    if let Some(dir) = get("HOMESTEAD_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
}
