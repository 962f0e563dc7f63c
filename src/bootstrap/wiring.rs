//! # Dependency Injection
//!
//! Builds the adapters from [`AppConfig`] and hands them to the use cases.
//! This is the only module that depends on `hs-infra` and `hs-app` together.
//! Assembly only: adapters validate their own settings when constructed.

use std::sync::Arc;
use std::time::Duration;

use hs_app::usecases::index_sync::{IndexSync, IndexSyncConfig};
use hs_app::usecases::users::CheckUserExists;
use hs_core::config::{AppConfig, ConfigError};
use hs_core::ports::{IdentityLookupPort, SearchIndexPort};
use hs_infra::marketplace::{IntegrationApiClient, IntegrationApiConfig};
use hs_infra::search::{AlgoliaConfig, AlgoliaSearchIndex, InMemorySearchIndex};
use tracing::info;

pub type WiringResult<T> = Result<T, WiringError>;

#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Search client initialization failed: {0}")]
    SearchClient(#[source] anyhow::Error),

    #[error("Marketplace client initialization failed: {0}")]
    MarketplaceClient(#[source] anyhow::Error),
}

/// Use cases served over HTTP.
#[derive(Clone)]
pub struct AppServices {
    pub index_sync: Arc<IndexSync>,
    pub check_user_exists: Arc<CheckUserExists>,
}

/// Which search backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    Algolia,
    Memory,
}

impl SearchBackend {
    /// An unset backend means the hosted service.
    pub fn from_config(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "algolia" => Ok(SearchBackend::Algolia),
            "memory" => Ok(SearchBackend::Memory),
            other => Err(ConfigError::Invalid {
                key: "HOMESTEAD_SEARCH_BACKEND",
                message: format!("unknown search backend '{other}'"),
            }),
        }
    }
}

pub fn wire_services(config: &AppConfig) -> WiringResult<AppServices> {
    let search_index = build_search_index(config)?;
    let identity_lookup = build_identity_lookup(config)?;

    let index_sync_config = IndexSyncConfig::new(Some(config.default_index.as_str()));
    info!(default_index = ?index_sync_config.default_index, "index sync configured");

    Ok(AppServices {
        index_sync: Arc::new(IndexSync::new(search_index, index_sync_config)),
        check_user_exists: Arc::new(CheckUserExists::new(identity_lookup)),
    })
}

fn build_search_index(config: &AppConfig) -> WiringResult<Arc<dyn SearchIndexPort>> {
    match SearchBackend::from_config(&config.search_backend)? {
        SearchBackend::Memory => {
            info!("using in-memory search index");
            Ok(Arc::new(InMemorySearchIndex::new()))
        }
        SearchBackend::Algolia => {
            let mut algolia =
                AlgoliaConfig::new(&config.algolia_app_id, &config.algolia_admin_api_key)?;
            if !config.algolia_host.trim().is_empty() {
                algolia = algolia.with_host(&config.algolia_host)?;
            }
            if config.search_timeout_secs > 0 {
                algolia = algolia.with_timeout(Duration::from_secs(config.search_timeout_secs));
            }
            info!(app_id = algolia.app_id(), "using hosted search index");
            let client = AlgoliaSearchIndex::new(algolia).map_err(WiringError::SearchClient)?;
            Ok(Arc::new(client))
        }
    }
}

fn build_identity_lookup(config: &AppConfig) -> WiringResult<Arc<dyn IdentityLookupPort>> {
    let mut marketplace = IntegrationApiConfig::new(
        &config.integration_client_id,
        &config.integration_client_secret,
    )?;
    if !config.marketplace_api_base_url.trim().is_empty() {
        marketplace = marketplace.with_base_url(&config.marketplace_api_base_url)?;
    }
    let client = IntegrationApiClient::new(marketplace).map_err(WiringError::MarketplaceClient)?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> AppConfig {
        AppConfig {
            search_backend: "memory".to_string(),
            integration_client_id: "client".to_string(),
            integration_client_secret: "secret".to_string(),
            default_index: "listings".to_string(),
            ..AppConfig::empty()
        }
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert_eq!(SearchBackend::from_config(" Memory ").unwrap(), SearchBackend::Memory);
        assert_eq!(SearchBackend::from_config("").unwrap(), SearchBackend::Algolia);
        assert!(SearchBackend::from_config("elastic").is_err());
    }

    #[test]
    fn hosted_backend_requires_credentials() {
        let config = AppConfig {
            search_backend: "algolia".to_string(),
            ..memory_config()
        };

        let err = wire_services(&config).err().unwrap();

        assert!(matches!(
            err,
            WiringError::Config(ConfigError::Missing("ALGOLIA_APP_ID"))
        ));
    }

    #[test]
    fn marketplace_credentials_are_required() {
        let config = AppConfig {
            integration_client_secret: String::new(),
            ..memory_config()
        };

        let err = wire_services(&config).err().unwrap();

        assert!(matches!(
            err,
            WiringError::Config(ConfigError::Missing("MARKETPLACE_INTEGRATION_CLIENT_SECRET"))
        ));
    }

    #[test]
    fn memory_backend_wires_with_default_index() {
        let services = wire_services(&memory_config()).unwrap();
        assert_eq!(
            services.index_sync.config().default_index.as_ref().map(|i| i.as_str()),
            Some("listings")
        );
    }
}
