//! Hosted search service client (Algolia REST API).
//!
//! Every port call is exactly one HTTP request. Upstream error messages are
//! passed through unchanged.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use hs_core::config::ConfigError;
use hs_core::ports::SearchIndexPort;
use hs_core::search::{
    IndexName, IndexRecord, ObjectId, SaveObjectsResult, SearchIndexError, SearchPage,
    SearchParams, TaskAck,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const APP_ID_HEADER: &str = "x-algolia-application-id";
const API_KEY_HEADER: &str = "x-algolia-api-key";

/// Validated connection settings.
#[derive(Debug, Clone)]
pub struct AlgoliaConfig {
    app_id: String,
    api_key: String,
    base_url: Url,
    timeout: Duration,
}

impl AlgoliaConfig {
    /// Checks the credentials once; requests never re-validate them.
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let app_id = app_id.into().trim().to_string();
        let api_key = api_key.into().trim().to_string();
        if app_id.is_empty() {
            return Err(ConfigError::Missing("ALGOLIA_APP_ID"));
        }
        if api_key.is_empty() {
            return Err(ConfigError::Missing("ALGOLIA_ADMIN_API_KEY"));
        }
        let base_url = Url::parse(&format!("https://{app_id}.algolia.net")).map_err(|e| {
            ConfigError::Invalid {
                key: "ALGOLIA_APP_ID",
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            app_id,
            api_key,
            base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Point the client at another host (self-hosted proxies, tests).
    pub fn with_host(mut self, host: &str) -> Result<Self, ConfigError> {
        self.base_url = Url::parse(host).map_err(|e| ConfigError::Invalid {
            key: "ALGOLIA_HOST",
            message: e.to_string(),
        })?;
        if self.base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                key: "ALGOLIA_HOST",
                message: format!("{host} is not an http(s) URL"),
            });
        }
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

pub struct AlgoliaSearchIndex {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    message: String,
}

impl AlgoliaSearchIndex {
    pub fn new(config: AlgoliaConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            APP_ID_HEADER,
            HeaderValue::from_str(&config.app_id).context("Invalid Algolia application id")?,
        );
        let mut key = HeaderValue::from_str(&config.api_key).context("Invalid Algolia API key")?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build search HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    /// `/1/indexes/{index}/{segments...}` with every segment percent-encoded.
    fn endpoint(&self, index: &IndexName, segments: &[&str]) -> Result<Url, SearchIndexError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SearchIndexError::InvalidRequest("search host is not a base URL".into()))?
            .pop_if_empty()
            .extend(["1", "indexes", index.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SearchIndexError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<UpstreamError>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| {
                    if body.trim().is_empty() {
                        status.to_string()
                    } else {
                        body
                    }
                });
            debug!(%status, %message, "Search service returned an error");
            return Err(map_status_code(status, message));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| SearchIndexError::Decode(e.to_string()))
    }
}

fn map_transport_error(err: reqwest::Error) -> SearchIndexError {
    if err.is_timeout() {
        SearchIndexError::Timeout
    } else {
        SearchIndexError::Network(err.to_string())
    }
}

fn map_status_code(code: StatusCode, message: String) -> SearchIndexError {
    match code {
        StatusCode::BAD_REQUEST => SearchIndexError::InvalidRequest(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SearchIndexError::Unauthorized(message),
        StatusCode::NOT_FOUND => SearchIndexError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => SearchIndexError::Timeout,
        _ => SearchIndexError::Upstream {
            status: code.as_u16(),
            message,
        },
    }
}

fn batch_body(records: Vec<IndexRecord>) -> Value {
    let requests: Vec<Value> = records
        .into_iter()
        .map(|record| {
            // Records without an id are added and get one from the service.
            let action = if record.object_id().is_some() {
                "updateObject"
            } else {
                "addObject"
            };
            json!({ "action": action, "body": record })
        })
        .collect();
    json!({ "requests": requests })
}

#[async_trait]
impl SearchIndexPort for AlgoliaSearchIndex {
    #[instrument(skip_all, fields(index = %index, count = records.len()))]
    async fn save_objects(
        &self,
        index: &IndexName,
        records: Vec<IndexRecord>,
    ) -> Result<SaveObjectsResult, SearchIndexError> {
        let url = self.endpoint(index, &["batch"])?;
        self.send(self.request(Method::POST, url).json(&batch_body(records)))
            .await
    }

    #[instrument(skip_all, fields(index = %index, object_id = %object_id))]
    async fn get_object(
        &self,
        index: &IndexName,
        object_id: &ObjectId,
    ) -> Result<IndexRecord, SearchIndexError> {
        let url = self.endpoint(index, &[object_id.as_str()])?;
        self.send(self.request(Method::GET, url)).await
    }

    #[instrument(skip_all, fields(index = %index, object_id = %object_id))]
    async fn partial_update_object(
        &self,
        index: &IndexName,
        object_id: &ObjectId,
        partial: &Map<String, Value>,
    ) -> Result<TaskAck, SearchIndexError> {
        let mut url = self.endpoint(index, &[object_id.as_str(), "partial"])?;
        url.query_pairs_mut()
            .append_pair("createIfNotExists", "false");
        self.send(self.request(Method::POST, url).json(partial))
            .await
    }

    #[instrument(skip_all, fields(index = %index, object_id = %object_id))]
    async fn delete_object(
        &self,
        index: &IndexName,
        object_id: &ObjectId,
    ) -> Result<TaskAck, SearchIndexError> {
        let url = self.endpoint(index, &[object_id.as_str()])?;
        self.send(self.request(Method::DELETE, url)).await
    }

    #[instrument(skip_all, fields(index = %index))]
    async fn search(
        &self,
        index: &IndexName,
        params: &SearchParams,
    ) -> Result<SearchPage, SearchIndexError> {
        let url = self.endpoint(index, &["query"])?;
        self.send(self.request(Method::POST, url).json(params)).await
    }

    #[instrument(skip_all, fields(index = %index))]
    async fn delete_by(
        &self,
        index: &IndexName,
        filters: &str,
    ) -> Result<TaskAck, SearchIndexError> {
        let url = self.endpoint(index, &["deleteByQuery"])?;
        self.send(
            self.request(Method::POST, url)
                .json(&json!({ "filters": filters })),
        )
        .await
    }

    #[instrument(skip_all, fields(index = %index))]
    async fn clear_objects(&self, index: &IndexName) -> Result<TaskAck, SearchIndexError> {
        let url = self.endpoint(index, &["clear"])?;
        self.send(self.request(Method::POST, url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn index() -> IndexName {
        IndexName::new("listings").unwrap()
    }

    fn object_id(id: &str) -> ObjectId {
        ObjectId::new(id).unwrap()
    }

    fn client(server: &ServerGuard) -> AlgoliaSearchIndex {
        let config = AlgoliaConfig::new("APPID", "secret-key")
            .unwrap()
            .with_host(&server.url())
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        AlgoliaSearchIndex::new(config).unwrap()
    }

    #[test]
    fn config_requires_credentials() {
        assert_eq!(
            AlgoliaConfig::new("", "key").unwrap_err(),
            ConfigError::Missing("ALGOLIA_APP_ID")
        );
        assert_eq!(
            AlgoliaConfig::new("APP", "  ").unwrap_err(),
            ConfigError::Missing("ALGOLIA_ADMIN_API_KEY")
        );
        assert!(AlgoliaConfig::new("APP", "key")
            .unwrap()
            .with_host("not a url")
            .is_err());
    }

    #[tokio::test]
    async fn save_objects_sends_batch_with_credentials() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/1/indexes/listings/batch")
            .match_header("x-algolia-application-id", "APPID")
            .match_header("x-algolia-api-key", "secret-key")
            .match_body(Matcher::Json(json!({
                "requests": [
                    {"action": "updateObject", "body": {"objectID": "x", "foo": 1}},
                    {"action": "addObject", "body": {"foo": 2}}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"taskID": 7, "objectIDs": ["x", "generated-1"]}"#)
            .create_async()
            .await;

        let records = vec![
            IndexRecord::from_json(json!({"objectID": "x", "foo": 1})).unwrap(),
            IndexRecord::from_json(json!({"foo": 2})).unwrap(),
        ];
        let result = client(&server).save_objects(&index(), records).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.task_id, Some(7));
        assert_eq!(result.object_ids, vec![object_id("x"), object_id("generated-1")]);
    }

    #[tokio::test]
    async fn get_object_maps_404_to_not_found_with_upstream_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/1/indexes/listings/missing")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "ObjectID does not exist", "status": 404}"#)
            .create_async()
            .await;

        let err = client(&server)
            .get_object(&index(), &object_id("missing"))
            .await
            .unwrap_err();

        assert_eq!(err, SearchIndexError::NotFound("ObjectID does not exist".into()));
    }

    #[tokio::test]
    async fn object_ids_are_percent_encoded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/1/indexes/listings/a%2Fb%20c")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"objectID": "a/b c"}"#)
            .create_async()
            .await;

        let record = client(&server)
            .get_object(&index(), &object_id("a/b c"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(record.object_id(), Some(object_id("a/b c")));
    }

    #[tokio::test]
    async fn partial_update_never_creates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/1/indexes/listings/x/partial")
            .match_query(Matcher::UrlEncoded("createIfNotExists".into(), "false".into()))
            .match_body(Matcher::Json(json!({"foo": 2})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"objectID": "x", "taskID": 9, "updatedAt": "2024-01-01T00:00:00Z"}"#)
            .create_async()
            .await;

        let partial = json!({"foo": 2});
        let ack = client(&server)
            .partial_update_object(&index(), &object_id("x"), partial.as_object().unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(ack.task_id, Some(9));
    }

    #[tokio::test]
    async fn search_posts_params_and_decodes_page() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/1/indexes/listings/query")
            .match_body(Matcher::PartialJson(json!({"query": "cabin", "hitsPerPage": 2})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"hits": [{"objectID": "1"}], "nbHits": 1, "page": 0, "nbPages": 1,
                    "hitsPerPage": 2, "processingTimeMS": 1, "query": "cabin"}"#,
            )
            .create_async()
            .await;

        let params = SearchParams {
            hits_per_page: Some(2),
            ..SearchParams::query("cabin")
        };
        let page = client(&server).search(&index(), &params).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.nb_hits, 1);
        assert_eq!(page.hits, vec![json!({"objectID": "1"})]);
    }

    #[tokio::test]
    async fn delete_by_sends_filters() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/1/indexes/listings/deleteByQuery")
            .match_body(Matcher::Json(json!({"filters": "category:sold"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"taskID": 3, "updatedAt": "2024-01-01T00:00:00Z"}"#)
            .create_async()
            .await;

        let ack = client(&server)
            .delete_by(&index(), "category:sold")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(ack.task_id, Some(3));
    }

    #[tokio::test]
    async fn status_codes_map_to_error_kinds() {
        let mut server = Server::new_async().await;
        let _forbidden = server
            .mock("POST", "/1/indexes/listings/clear")
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Method not allowed with this API key"}"#)
            .create_async()
            .await;
        let _unavailable = server
            .mock("DELETE", "/1/indexes/listings/x")
            .with_status(503)
            .with_body("")
            .create_async()
            .await;

        let client = client(&server);
        assert_eq!(
            client.clear_objects(&index()).await.unwrap_err(),
            SearchIndexError::Unauthorized("Method not allowed with this API key".into())
        );
        assert!(matches!(
            client.delete_object(&index(), &object_id("x")).await.unwrap_err(),
            SearchIndexError::Upstream { status: 503, .. }
        ));
    }
}
