//! Duplicate-account check over HTTP.
//!
//! Calls the server's `POST /users/exists` endpoint. A 404 from the endpoint
//! means the directory has no such user, same as an explicit `exists: false`.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use hs_core::account::{DuplicateCheckOutcome, UserExistence};
use hs_core::ports::DuplicateAccountCheckPort;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const EXISTS_PATH: &str = "users/exists";

pub struct HttpDuplicateAccountChecker {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpDuplicateAccountChecker {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut base = reqwest::Url::parse(base_url)
            .with_context(|| format!("Invalid duplicate-check base URL: {base_url}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(EXISTS_PATH)
            .context("Failed to build duplicate-check URL")?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, endpoint })
    }

    async fn request(&self, email: &str) -> anyhow::Result<UserExistence> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(|e| anyhow!("request failed: {e}"))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(UserExistence::not_exists());
        }
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.ok();
            let detail = body
                .and_then(|b| b.error.or(b.message))
                .unwrap_or_else(|| status.to_string());
            return Err(anyhow!("{detail} ({status})"));
        }

        response
            .json::<UserExistence>()
            .await
            .map_err(|e| anyhow!("invalid response: {e}"))
    }
}

#[async_trait]
impl DuplicateAccountCheckPort for HttpDuplicateAccountChecker {
    async fn check(&self, email: &str) -> DuplicateCheckOutcome {
        match self.request(email).await {
            Ok(existence) => {
                debug!(exists = existence.exists, "Duplicate-account check answered");
                DuplicateCheckOutcome::from(&existence)
            }
            Err(err) => {
                warn!(error = %err, "Duplicate-account check failed");
                DuplicateCheckOutcome::CheckFailed {
                    message: err.to_string(),
                }
            }
        }
    }
}
