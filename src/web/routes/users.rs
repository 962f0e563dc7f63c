use std::convert::Infallible;
use std::sync::Arc;

use hs_app::usecases::users::{CheckUserExists, CheckUserExistsError};
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::reply::{self, Json, WithStatus};
use warp::{Filter, Rejection, Reply};

use super::with_shared;
use crate::web::json_body;

#[derive(Debug, Default, Deserialize)]
struct ExistsBody {
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct LookupFailure {
    error: &'static str,
    message: &'static str,
}

/// `POST /users/exists`
pub fn route(
    check_user_exists: Arc<CheckUserExists>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("users" / "exists")
        .and(warp::post())
        .and(with_shared(check_user_exists))
        .and(json_body::<ExistsBody>())
        .and_then(user_exists)
}

async fn user_exists(
    check_user_exists: Arc<CheckUserExists>,
    body: ExistsBody,
) -> Result<WithStatus<Json>, Infallible> {
    let email = body.email.unwrap_or_default();
    let reply = match check_user_exists.execute(&email).await {
        Ok(existence) => reply::with_status(reply::json(&existence), StatusCode::OK),
        Err(CheckUserExistsError::EmailRequired) => reply::with_status(
            reply::json(&LookupFailure {
                error: "email required",
                message: "Request body must include an email",
            }),
            StatusCode::BAD_REQUEST,
        ),
        Err(CheckUserExistsError::Lookup(_)) => reply::with_status(
            reply::json(&LookupFailure {
                error: "Failed to check user existence",
                message: "Internal server error",
            }),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    };
    Ok(reply)
}
