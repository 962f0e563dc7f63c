//! HTTP surface tests against the in-memory search index.

use std::sync::Arc;

use async_trait::async_trait;
use hs_app::usecases::index_sync::{IndexSync, IndexSyncConfig};
use hs_app::usecases::users::CheckUserExists;
use hs_core::account::{IdentityLookupError, MarketplaceUser};
use hs_core::ports::IdentityLookupPort;
use hs_infra::search::InMemorySearchIndex;
use homestead_lib::bootstrap::AppServices;
use homestead_lib::web;
use mockall::mock;
use serde_json::{json, Value};
use warp::http::StatusCode;

mock! {
    Lookup {}

    #[async_trait]
    impl IdentityLookupPort for Lookup {
        async fn find_user_by_email(&self, email: &str)
            -> Result<MarketplaceUser, IdentityLookupError>;
    }
}

fn services(default_index: Option<&str>, lookup: MockLookup) -> AppServices {
    AppServices {
        index_sync: Arc::new(IndexSync::new(
            Arc::new(InMemorySearchIndex::new()),
            IndexSyncConfig::new(default_index),
        )),
        check_user_exists: Arc::new(CheckUserExists::new(Arc::new(lookup))),
    }
}

fn index_services() -> AppServices {
    services(Some("listings"), MockLookup::new())
}

async fn call(
    services: &AppServices,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = warp::test::request().method(method).path(path);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.reply(&web::routes(services.clone())).await;
    let body = serde_json::from_slice(response.body()).unwrap();
    (response.status(), body)
}

#[tokio::test]
async fn saved_object_is_returned_by_get() {
    let services = index_services();

    let (status, body) = call(
        &services,
        "POST",
        "/objects",
        Some(json!({"objects": [{"objectID": "x", "foo": 1}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["objectIDs"], json!(["x"]));

    let (status, body) = call(&services, "GET", "/objects/x", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["foo"], 1);
}

#[tokio::test]
async fn explicit_index_in_query_is_used() {
    let services = index_services();
    call(
        &services,
        "POST",
        "/objects",
        Some(json!({"indexName": "archive", "objects": [{"objectID": "old"}]})),
    )
    .await;

    let (status, _) = call(&services, "GET", "/objects/old", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&services, "GET", "/objects/old?indexName=archive", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["objectID"], "old");
}

#[tokio::test]
async fn encoded_object_ids_are_decoded_in_paths() {
    let services = index_services();
    call(
        &services,
        "POST",
        "/objects",
        Some(json!({"objects": [
            {"objectID": "a b", "foo": 1},
            {"objectID": "lot/7", "foo": 2}
        ]})),
    )
    .await;

    let (status, body) = call(&services, "GET", "/objects/a%20b", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["objectID"], "a b");

    let (status, body) = call(
        &services,
        "PATCH",
        "/objects/lot%2F7",
        Some(json!({"partial": {"foo": 3}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["foo"], 3);

    let (status, _) = call(&services, "DELETE", "/objects/a%20b", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&services, "GET", "/objects/a%20b", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn object_id_that_is_not_utf8_is_rejected() {
    let (status, body) = call(&index_services(), "GET", "/objects/%FF", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "objectID is not valid UTF-8");
}

#[tokio::test]
async fn objects_must_be_an_array() {
    let (status, body) = call(
        &index_services(),
        "POST",
        "/objects",
        Some(json!({"objects": {"objectID": "x"}})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "error": "objects must be an array"})
    );
}

#[tokio::test]
async fn missing_object_is_not_found() {
    let (status, body) = call(&index_services(), "GET", "/objects/ghost", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "ObjectID does not exist");
}

#[tokio::test]
async fn get_without_object_id_is_rejected() {
    let (status, body) = call(&index_services(), "GET", "/objects", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "objectID required");
}

#[tokio::test]
async fn patch_merges_partial_or_bare_body() {
    let services = index_services();
    call(
        &services,
        "POST",
        "/objects",
        Some(json!({"objects": [{"objectID": "x", "foo": 1, "bar": "keep"}]})),
    )
    .await;

    let (status, body) = call(
        &services,
        "PATCH",
        "/objects/x",
        Some(json!({"partial": {"foo": 2}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"objectID": "x", "foo": 2, "bar": "keep"}));

    let (status, body) = call(&services, "PATCH", "/objects/x", Some(json!({"bar": "new"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bar"], "new");
    assert_eq!(body["data"]["foo"], 2);
}

#[tokio::test]
async fn patch_never_creates() {
    let services = index_services();

    let (status, _) = call(
        &services,
        "PATCH",
        "/objects/ghost",
        Some(json!({"partial": {"foo": 2}})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&services, "GET", "/objects/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_without_partial_is_rejected() {
    let (status, body) = call(&index_services(), "PATCH", "/objects/x", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "objectID and partial data required");
}

#[tokio::test]
async fn delete_is_tolerant_of_missing_objects() {
    let (status, body) = call(&index_services(), "DELETE", "/objects/ghost", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn clear_without_index_or_default_is_rejected() {
    let services = services(None, MockLookup::new());

    let (status, body) = call(&services, "POST", "/objects/clear", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "indexName required"}));
}

#[tokio::test]
async fn delete_by_requires_filters() {
    let (status, body) = call(
        &index_services(),
        "POST",
        "/objects/deleteBy",
        Some(json!({"indexName": "listings"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "filters required");
}

#[tokio::test]
async fn delete_by_removes_matching_records() {
    let services = index_services();
    call(
        &services,
        "POST",
        "/objects",
        Some(json!({"objects": [
            {"objectID": "a", "state": "TX"},
            {"objectID": "b", "state": "OK"}
        ]})),
    )
    .await;

    let (status, _) = call(
        &services,
        "POST",
        "/objects/deleteBy",
        Some(json!({"filters": "state:TX"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&services, "GET", "/objects/a", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&services, "GET", "/objects/b", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn search_requires_index_name() {
    let (status, body) = call(
        &index_services(),
        "POST",
        "/search",
        Some(json!({"query": "cabin"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "indexName required");
}

#[tokio::test]
async fn search_returns_matching_hits() {
    let services = index_services();
    call(
        &services,
        "POST",
        "/objects",
        Some(json!({"objects": [
            {"objectID": "a", "title": "Lakeside Cabin"},
            {"objectID": "b", "title": "Double Wide"}
        ]})),
    )
    .await;

    let (status, body) = call(
        &services,
        "POST",
        "/search",
        Some(json!({"indexName": "listings", "query": "cabin", "hitsPerPage": 5})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nbHits"], 1);
    assert_eq!(body["data"]["hits"][0]["objectID"], "a");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let response = warp::test::request()
        .method("POST")
        .path("/objects")
        .header("content-type", "application/json")
        .body("{\"objects\": [")
        .reply(&web::routes(index_services()))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, body) = call(&index_services(), "GET", "/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn user_exists_reports_existing_user() {
    let mut lookup = MockLookup::new();
    lookup
        .expect_find_user_by_email()
        .withf(|email| email == "a@b.com")
        .returning(|_| {
            Ok(MarketplaceUser {
                id: "u-1".into(),
                email: Some("a@b.com".into()),
            })
        });

    let (status, body) = call(
        &services(None, lookup),
        "POST",
        "/users/exists",
        Some(json!({"email": "a@b.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"exists": true, "message": "User already exists"}));
}

#[tokio::test]
async fn user_exists_maps_not_found_to_false() {
    let mut lookup = MockLookup::new();
    lookup
        .expect_find_user_by_email()
        .returning(|_| Err(IdentityLookupError::NotFound));

    let (status, body) = call(
        &services(None, lookup),
        "POST",
        "/users/exists",
        Some(json!({"email": "new@b.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"exists": false, "message": "User does not exist"}));
}

#[tokio::test]
async fn user_exists_failure_is_internal_error() {
    let mut lookup = MockLookup::new();
    lookup.expect_find_user_by_email().returning(|_| {
        Err(IdentityLookupError::Upstream {
            status: 502,
            message: "bad gateway".into(),
        })
    });

    let (status, body) = call(
        &services(None, lookup),
        "POST",
        "/users/exists",
        Some(json!({"email": "a@b.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "Failed to check user existence", "message": "Internal server error"})
    );
}
