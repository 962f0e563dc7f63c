//! Record routes under `/objects`.

use std::convert::Infallible;
use std::sync::Arc;

use hs_app::usecases::index_sync::{IndexSync, IndexSyncError};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::{Map, Value};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use super::with_shared;
use crate::web::json_body;
use crate::web::response::{ApiReply, ApiResponse};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexQuery {
    index_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveObjectsBody {
    index_name: Option<String>,
    objects: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteByBody {
    index_name: Option<String>,
    filters: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearBody {
    index_name: Option<String>,
}

pub fn routes(
    sync: Arc<IndexSync>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let save = warp::path!("objects")
        .and(warp::post())
        .and(with_shared(sync.clone()))
        .and(json_body::<SaveObjectsBody>())
        .and_then(save_objects);

    let delete_by = warp::path!("objects" / "deleteBy")
        .and(warp::post())
        .and(with_shared(sync.clone()))
        .and(json_body::<DeleteByBody>())
        .and_then(delete_by);

    let clear = warp::path!("objects" / "clear")
        .and(warp::post())
        .and(with_shared(sync.clone()))
        .and(json_body::<ClearBody>())
        .and_then(clear);

    let get = warp::path!("objects" / String)
        .and(warp::get())
        .and(warp::query::<IndexQuery>())
        .and(with_shared(sync.clone()))
        .and_then(get_object);

    let patch = warp::path!("objects" / String)
        .and(warp::patch())
        .and(with_shared(sync.clone()))
        .and(json_body::<Map<String, Value>>())
        .and_then(partial_update);

    let delete = warp::path!("objects" / String)
        .and(warp::delete())
        .and(warp::query::<IndexQuery>())
        .and(with_shared(sync))
        .and_then(delete_object);

    // `/objects` without an id, for the verbs that need one.
    let missing_id = warp::path!("objects")
        .and(warp::get().or(warp::delete()).unify())
        .map(|| missing(IndexSyncError::ObjectIdRequired));
    let missing_patch_id = warp::path!("objects")
        .and(warp::patch())
        .map(|| missing(IndexSyncError::PartialRequired));

    save.or(delete_by)
        .or(clear)
        .or(get)
        .or(patch)
        .or(delete)
        .or(missing_id)
        .or(missing_patch_id)
}

fn missing(err: IndexSyncError) -> ApiReply {
    ApiResponse::failure(StatusCode::BAD_REQUEST, err.to_string())
}

/// Path segments arrive still percent-encoded.
fn decode_object_id(raw: &str) -> Result<String, ApiReply> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|id| id.into_owned())
        .map_err(|_| {
            ApiResponse::failure(StatusCode::BAD_REQUEST, "objectID is not valid UTF-8")
        })
}

async fn save_objects(
    sync: Arc<IndexSync>,
    body: SaveObjectsBody,
) -> Result<ApiReply, Infallible> {
    let Some(Value::Array(objects)) = body.objects else {
        return Ok(ApiResponse::failure(
            StatusCode::BAD_REQUEST,
            "objects must be an array",
        ));
    };
    let result = sync.save_objects(body.index_name.as_deref(), objects).await;
    Ok(ApiResponse::from_result(result))
}

async fn get_object(
    object_id: String,
    query: IndexQuery,
    sync: Arc<IndexSync>,
) -> Result<ApiReply, Infallible> {
    let object_id = match decode_object_id(&object_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    let result = sync
        .get_object(query.index_name.as_deref(), &object_id)
        .await;
    Ok(ApiResponse::from_result(result))
}

/// The partial is the body's `partial` member, or else the body itself minus
/// `indexName`.
async fn partial_update(
    object_id: String,
    sync: Arc<IndexSync>,
    mut body: Map<String, Value>,
) -> Result<ApiReply, Infallible> {
    let object_id = match decode_object_id(&object_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    let index_name = match body.remove("indexName") {
        Some(Value::String(name)) => Some(name),
        _ => None,
    };
    let partial = body
        .remove("partial")
        .unwrap_or_else(|| Value::Object(body));
    let result = sync
        .partial_update(index_name.as_deref(), &object_id, Some(&partial))
        .await;
    Ok(ApiResponse::from_result(result))
}

async fn delete_object(
    object_id: String,
    query: IndexQuery,
    sync: Arc<IndexSync>,
) -> Result<ApiReply, Infallible> {
    let object_id = match decode_object_id(&object_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    let result = sync
        .delete_object(query.index_name.as_deref(), &object_id)
        .await;
    Ok(ApiResponse::from_result(result))
}

async fn delete_by(sync: Arc<IndexSync>, body: DeleteByBody) -> Result<ApiReply, Infallible> {
    let result = sync
        .delete_by(body.index_name.as_deref(), body.filters.as_deref())
        .await;
    Ok(ApiResponse::from_result(result))
}

async fn clear(sync: Arc<IndexSync>, body: ClearBody) -> Result<ApiReply, Infallible> {
    let result = sync.clear(body.index_name.as_deref()).await;
    Ok(ApiResponse::from_result(result))
}
