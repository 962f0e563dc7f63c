use std::sync::Arc;

use async_trait::async_trait;
use hs_core::account::DuplicateCheckOutcome;
use hs_core::ports::DuplicateAccountCheckPort;
use tracing::warn;

use crate::usecases::users::CheckUserExists;

/// Duplicate-account check answered in-process by [`CheckUserExists`].
pub struct LocalDuplicateAccountCheck {
    check_user_exists: Arc<CheckUserExists>,
}

impl LocalDuplicateAccountCheck {
    pub fn new(check_user_exists: Arc<CheckUserExists>) -> Self {
        Self { check_user_exists }
    }
}

#[async_trait]
impl DuplicateAccountCheckPort for LocalDuplicateAccountCheck {
    async fn check(&self, email: &str) -> DuplicateCheckOutcome {
        match self.check_user_exists.execute(email).await {
            Ok(existence) => DuplicateCheckOutcome::from(&existence),
            Err(err) => {
                warn!(error = %err, "duplicate account check failed");
                DuplicateCheckOutcome::CheckFailed {
                    message: err.to_string(),
                }
            }
        }
    }
}
