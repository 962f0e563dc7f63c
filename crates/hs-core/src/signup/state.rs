use serde::{Deserialize, Serialize};

use crate::signup::checkpoint::WizardCheckpoint;
use crate::signup::error::SignupError;
use crate::signup::fields::FieldValues;
use crate::signup::role::Role;
use crate::signup::step::{steps_for, StepId};

/// What a pending duplicate-account check will do once it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckIntent {
    /// Move to the next step.
    Advance,
    /// Hand the values to account creation.
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum WizardPhase {
    /// Accepting field edits and navigation.
    Editing,
    /// Waiting for the duplicate-account check of `email`.
    CheckingDuplicate { email: String, intent: CheckIntent },
    /// Waiting for account creation.
    Submitting,
    /// Account created; the wizard is finished.
    Completed,
}

/// Signup wizard state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub current_step: StepId,
    pub field_values: FieldValues,
    pub phase: WizardPhase,
    pub error: Option<SignupError>,
    /// Whether this state was seeded from a checkpoint.
    pub restored: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::initial()
    }
}

impl WizardState {
    pub fn initial() -> Self {
        Self {
            current_step: StepId::INITIAL,
            field_values: FieldValues::new(),
            phase: WizardPhase::Editing,
            error: None,
            restored: false,
        }
    }

    /// Seed state from a checkpoint. A step that is not part of the restored
    /// role's sequence falls back to the initial step; values are kept.
    pub fn from_checkpoint(checkpoint: WizardCheckpoint) -> Self {
        let role = checkpoint.field_values.role();
        let current_step = if checkpoint.current_tab.belongs_to(role) {
            checkpoint.current_tab
        } else {
            StepId::INITIAL
        };
        Self {
            current_step,
            field_values: checkpoint.field_values,
            phase: WizardPhase::Editing,
            error: None,
            restored: true,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.field_values.role()
    }

    pub fn steps(&self) -> &'static [StepId] {
        steps_for(self.role())
    }

    /// Zero-based position of the current step in the role's sequence.
    pub fn step_index(&self) -> usize {
        self.current_step.position(self.role()).unwrap_or(0)
    }

    pub fn is_editing(&self) -> bool {
        self.phase == WizardPhase::Editing
    }

    pub fn is_completed(&self) -> bool {
        self.phase == WizardPhase::Completed
    }

    pub fn can_go_back(&self) -> bool {
        self.is_editing() && self.current_step != StepId::INITIAL
    }
}
