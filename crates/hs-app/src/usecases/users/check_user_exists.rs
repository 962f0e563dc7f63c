use std::sync::Arc;

use hs_core::account::{IdentityLookupError, UserExistence};
use hs_core::ports::IdentityLookupPort;
use tracing::{error, info_span, Instrument};

#[derive(Debug, thiserror::Error)]
pub enum CheckUserExistsError {
    #[error("email required")]
    EmailRequired,

    #[error("Failed to check user existence: {0}")]
    Lookup(#[source] IdentityLookupError),
}

/// Answers whether a marketplace user is registered under an email.
///
/// A lookup that comes back "not found" means the user does not exist; any
/// other lookup failure is an error.
pub struct CheckUserExists {
    lookup: Arc<dyn IdentityLookupPort>,
}

impl CheckUserExists {
    pub fn new(lookup: Arc<dyn IdentityLookupPort>) -> Self {
        Self { lookup }
    }

    pub async fn execute(&self, email: &str) -> Result<UserExistence, CheckUserExistsError> {
        let span = info_span!("usecase.users.check_exists");
        async {
            let email = email.trim();
            if email.is_empty() {
                return Err(CheckUserExistsError::EmailRequired);
            }

            match self.lookup.find_user_by_email(email).await {
                Ok(_) => Ok(UserExistence::exists()),
                Err(IdentityLookupError::NotFound) => Ok(UserExistence::not_exists()),
                Err(err) => {
                    error!(error = %err, "user existence lookup failed");
                    Err(CheckUserExistsError::Lookup(err))
                }
            }
        }
        .instrument(span)
        .await
    }
}
