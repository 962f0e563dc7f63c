//! HTTP surface (warp).

pub mod response;
pub mod routes;

use std::convert::Infallible;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::error;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::bootstrap::AppServices;
use response::ApiResponse;

const MAX_BODY_BYTES: u64 = 4 * 1024 * 1024;

/// The request body was not valid JSON for the route.
#[derive(Debug)]
pub struct InvalidBody(pub String);

impl warp::reject::Reject for InvalidBody {}

/// All routes, with rejections turned into JSON envelopes.
pub fn routes(
    services: AppServices,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    routes::objects::routes(services.index_sync.clone())
        .or(routes::search::route(services.index_sync.clone()))
        .or(routes::users::route(services.check_user_exists.clone()))
        .recover(handle_rejection)
        .with(warp::trace::request())
}

/// JSON body of type `T`. An empty body decodes as `T::default()`.
pub fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Default + Send + 'static,
{
    warp::body::content_length_limit(MAX_BODY_BYTES)
        .and(warp::body::bytes())
        .and_then(|body: Bytes| async move {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(T::default());
            }
            serde_json::from_slice(&body)
                .map_err(|err| warp::reject::custom(InvalidBody(err.to_string())))
        })
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let reply = if err.is_not_found() {
        ApiResponse::failure(StatusCode::NOT_FOUND, "not found")
    } else if let Some(InvalidBody(message)) = err.find::<InvalidBody>() {
        ApiResponse::failure(StatusCode::BAD_REQUEST, format!("invalid JSON body: {message}"))
    } else if let Some(invalid) = err.find::<warp::reject::InvalidQuery>() {
        ApiResponse::failure(StatusCode::BAD_REQUEST, invalid.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        ApiResponse::failure(StatusCode::PAYLOAD_TOO_LARGE, "payload too large")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiResponse::failure(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
    } else {
        error!(rejection = ?err, "unhandled rejection");
        ApiResponse::failure(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    };
    Ok(reply)
}
