//! JSON replies for the HTTP surface.

use hs_app::usecases::index_sync::{Envelope, IndexSyncError};
use serde::Serialize;
use tracing::{debug, error};
use warp::http::StatusCode;
use warp::reply::{self, Json, WithStatus};

pub type ApiReply = WithStatus<Json>;

/// Builds `{ success, data | error }` envelopes.
pub struct ApiResponse;

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> ApiReply {
        reply::with_status(reply::json(&Envelope::ok(data)), StatusCode::OK)
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> ApiReply {
        reply::with_status(reply::json(&Envelope::<()>::err(message)), status)
    }

    pub fn from_result<T: Serialize>(result: Result<T, IndexSyncError>) -> ApiReply {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    error!(error = %err, "index request failed");
                } else {
                    debug!(error = %err, status = status.as_u16(), "index request rejected");
                }
                Self::failure(status, err.to_string())
            }
        }
    }
}

/// Local validation is a client error, a missing record is 404, and any
/// other backend failure is a server error.
pub fn status_for(err: &IndexSyncError) -> StatusCode {
    if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
