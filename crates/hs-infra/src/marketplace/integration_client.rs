//! Marketplace Integration API client.
//!
//! Authenticates with client credentials (`scope=integ`) and looks users up by
//! email. The access token is cached until shortly before it expires.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use hs_core::account::{IdentityLookupError, MarketplaceUser};
use hs_core::config::ConfigError;
use hs_core::ports::IdentityLookupPort;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

pub const DEFAULT_API_BASE_URL: &str = "https://flex-api.sharetribe.com";

const TOKEN_PATH: &str = "v1/auth/token";
const USERS_SHOW_PATH: &str = "v1/integration_api/users/show";
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct IntegrationApiConfig {
    base_url: Url,
    client_id: String,
    client_secret: String,
    timeout: Duration,
}

impl IntegrationApiConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let client_id = client_id.into().trim().to_string();
        let client_secret = client_secret.into().trim().to_string();
        if client_id.is_empty() {
            return Err(ConfigError::Missing("MARKETPLACE_INTEGRATION_CLIENT_ID"));
        }
        if client_secret.is_empty() {
            return Err(ConfigError::Missing("MARKETPLACE_INTEGRATION_CLIENT_SECRET"));
        }
        Ok(Self {
            base_url: parse_base_url(DEFAULT_API_BASE_URL)?,
            client_id,
            client_secret,
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        key: "MARKETPLACE_API_BASE_URL",
        message,
    };
    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid(format!("{raw} is not an http(s) URL")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct UserDocument {
    data: Option<UserResource>,
}

#[derive(Debug, Deserialize)]
struct UserResource {
    id: String,
    #[serde(default)]
    attributes: UserAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct UserAttributes {
    #[serde(default)]
    email: Option<String>,
}

pub struct IntegrationApiClient {
    http: reqwest::Client,
    config: IntegrationApiConfig,
    token: Mutex<Option<CachedToken>>,
}

impl IntegrationApiClient {
    pub fn new(config: IntegrationApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build marketplace HTTP client")?;
        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> Result<Url, IdentityLookupError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| IdentityLookupError::Network(e.to_string()))
    }

    async fn access_token(&self) -> Result<String, IdentityLookupError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let response = self
            .http
            .post(self.url(TOKEN_PATH)?)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "client_credentials"),
                ("scope", "integ"),
            ])
            .send()
            .await
            .map_err(|e| IdentityLookupError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    IdentityLookupError::Unauthorized(body)
                }
                _ => IdentityLookupError::Upstream {
                    status: status.as_u16(),
                    message: body,
                },
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityLookupError::Decode(e.to_string()))?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(0))
            .saturating_sub(TOKEN_EXPIRY_MARGIN);
        debug!(lifetime_secs = lifetime.as_secs(), "Obtained integration access token");

        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl IdentityLookupPort for IntegrationApiClient {
    #[instrument(skip_all)]
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<MarketplaceUser, IdentityLookupError> {
        let token = self.access_token().await?;
        let mut url = self.url(USERS_SHOW_PATH)?;
        url.query_pairs_mut().append_pair("email", email);

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityLookupError::Network(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Err(IdentityLookupError::NotFound),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                // Token may have been revoked; fetch a fresh one next time.
                self.token.lock().await.take();
                let body = response.text().await.unwrap_or_default();
                warn!(%status, "Integration API rejected the access token");
                return Err(IdentityLookupError::Unauthorized(body));
            }
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(IdentityLookupError::Upstream {
                    status: status.as_u16(),
                    message: body,
                });
            }
            _ => {}
        }

        let document: UserDocument = response
            .json()
            .await
            .map_err(|e| IdentityLookupError::Decode(e.to_string()))?;
        match document.data {
            Some(user) if !user.id.is_empty() => Ok(MarketplaceUser {
                id: user.id,
                email: user.attributes.email,
            }),
            _ => Err(IdentityLookupError::NotFound),
        }
    }
}
