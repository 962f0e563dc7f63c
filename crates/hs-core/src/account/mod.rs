//! Account-existence domain.
//!
//! Before the wizard leaves the role step, and again before submitting, the
//! email is checked against the marketplace's user directory.

use serde::{Deserialize, Serialize};

/// Result of a duplicate-account check as seen by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DuplicateCheckOutcome {
    Exists,
    NotExists,
    /// The check could not be completed; the user may retry.
    CheckFailed { message: String },
}

/// Body returned by the user-existence endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserExistence {
    pub exists: bool,
    pub message: String,
}

impl UserExistence {
    pub const EXISTS_MESSAGE: &'static str = "User already exists";
    pub const NOT_EXISTS_MESSAGE: &'static str = "User does not exist";

    pub fn exists() -> Self {
        Self {
            exists: true,
            message: Self::EXISTS_MESSAGE.to_string(),
        }
    }

    pub fn not_exists() -> Self {
        Self {
            exists: false,
            message: Self::NOT_EXISTS_MESSAGE.to_string(),
        }
    }
}

impl From<&UserExistence> for DuplicateCheckOutcome {
    fn from(existence: &UserExistence) -> Self {
        if existence.exists {
            DuplicateCheckOutcome::Exists
        } else {
            DuplicateCheckOutcome::NotExists
        }
    }
}

/// A user record as returned by the marketplace identity lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityLookupError {
    #[error("user not found")]
    NotFound,

    #[error("identity lookup unauthorized: {0}")]
    Unauthorized(String),

    #[error("identity lookup failed with status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    Decode(String),
}
