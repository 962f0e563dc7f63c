use async_trait::async_trait;

use crate::account::{DuplicateCheckOutcome, IdentityLookupError, MarketplaceUser};
use crate::signup::{FieldValues, Role};

/// Answers "does an account already exist for this email?" for the wizard.
///
/// Failures are reported through [`DuplicateCheckOutcome::CheckFailed`] rather
/// than an error, since the wizard treats them as a retryable outcome.
#[async_trait]
pub trait DuplicateAccountCheckPort: Send + Sync {
    async fn check(&self, email: &str) -> DuplicateCheckOutcome;
}

/// Looks users up in the marketplace's user directory.
#[async_trait]
pub trait IdentityLookupPort: Send + Sync {
    async fn find_user_by_email(&self, email: &str)
        -> Result<MarketplaceUser, IdentityLookupError>;
}

/// Creates the marketplace account from the values collected by the wizard.
#[async_trait]
pub trait AccountRegistrationPort: Send + Sync {
    async fn register(&self, role: Role, values: &FieldValues) -> anyhow::Result<()>;
}
