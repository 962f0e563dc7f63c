use serde::{Deserialize, Serialize};

use crate::signup::step::StepId;
use crate::signup::validation::FieldIssue;

/// Errors surfaced to the user by the signup wizard.
///
/// None of these tear the wizard down; they block a transition and are shown
/// next to the current step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignupError {
    #[error("step {step} is incomplete")]
    Validation { step: StepId, issues: Vec<FieldIssue> },
    #[error("an account already exists for {email}")]
    AccountExists { email: String },
    #[error("could not verify the email address: {message}")]
    DuplicateCheckFailed { message: String },
    #[error("account creation failed: {message}")]
    SubmissionFailed { message: String },
    #[error("the role can only be changed on the role selection step")]
    RoleLocked,
    #[error("{action} is not available on step {step}")]
    NotAvailable { step: StepId, action: String },
}

impl SignupError {
    /// Whether retrying the same action may succeed without the user editing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SignupError::DuplicateCheckFailed { .. } | SignupError::SubmissionFailed { .. }
        )
    }
}
