use std::convert::Infallible;
use std::sync::Arc;

use hs_app::usecases::index_sync::{IndexSync, IndexSyncError};
use hs_core::search::SearchParams;
use serde::Deserialize;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use super::with_shared;
use crate::web::json_body;
use crate::web::response::{ApiReply, ApiResponse};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody {
    index_name: Option<String>,
    #[serde(flatten)]
    params: SearchParams,
}

/// `POST /search`. Unlike the record routes, the index must be named.
pub fn route(
    sync: Arc<IndexSync>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("search")
        .and(warp::post())
        .and(with_shared(sync))
        .and(json_body::<SearchBody>())
        .and_then(search)
}

async fn search(sync: Arc<IndexSync>, body: SearchBody) -> Result<ApiReply, Infallible> {
    let index_name = body
        .index_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let Some(index_name) = index_name else {
        return Ok(ApiResponse::failure(
            StatusCode::BAD_REQUEST,
            IndexSyncError::IndexNameRequired.to_string(),
        ));
    };
    let result = sync.search(Some(index_name), &body.params).await;
    Ok(ApiResponse::from_result(result))
}
