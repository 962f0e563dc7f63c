//! Signup state machine.
//!
//! A pure transition function over [`WizardState`]. Side effects are returned as
//! [`SignupAction`]s for the orchestrator to execute; their outcomes come back
//! in as events.

use serde::{Deserialize, Serialize};

use crate::account::DuplicateCheckOutcome;
use crate::signup::checkpoint::WizardCheckpoint;
use crate::signup::error::SignupError;
use crate::signup::fields::{FieldValue, FieldValues, EMAIL_FIELD, ROLE_FIELD};
use crate::signup::role::Role;
use crate::signup::state::{CheckIntent, WizardPhase, WizardState};
use crate::signup::step::StepId;
use crate::signup::validation::FieldIssue;

/// Events that drive the signup wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignupEvent {
    // Editing
    SetField { name: String, value: FieldValue },
    ClearField { name: String },

    // Navigation
    Next,
    Back,
    Submit,

    // Results (from orchestrator)
    DuplicateCheckResolved {
        email: String,
        outcome: DuplicateCheckOutcome,
    },
    SubmissionSucceeded,
    SubmissionFailed { message: String },

    // Control
    Abandon,
}

/// Side effects produced by state transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignupAction {
    /// Write the current values and step to the checkpoint store.
    PersistCheckpoint,
    /// Ask whether an account already exists for `email`.
    CheckDuplicateAccount { email: String },
    /// Hand the collected values to account creation.
    CreateAccount { role: Role, values: FieldValues },
    /// Remove the stored checkpoint.
    ClearCheckpoint,
}

/// Pure signup state machine.
pub struct SignupStateMachine;

impl SignupStateMachine {
    pub fn transition(state: WizardState, event: SignupEvent) -> (WizardState, Vec<SignupAction>) {
        if matches!(event, SignupEvent::Abandon) {
            return (WizardState::initial(), vec![SignupAction::ClearCheckpoint]);
        }

        match (state.phase.clone(), event) {
            (WizardPhase::Completed, _) => (state, Vec::new()),
            (
                WizardPhase::Editing | WizardPhase::CheckingDuplicate { .. },
                SignupEvent::SetField { name, value },
            ) => Self::edit(state, name, Some(value)),
            (
                WizardPhase::Editing | WizardPhase::CheckingDuplicate { .. },
                SignupEvent::ClearField { name },
            ) => Self::edit(state, name, None),
            (WizardPhase::Editing, SignupEvent::Next) => Self::next(state),
            (WizardPhase::Editing, SignupEvent::Back) => Self::back(state),
            (WizardPhase::Editing, SignupEvent::Submit) => Self::submit(state),
            (
                WizardPhase::CheckingDuplicate {
                    email: pending,
                    intent,
                },
                SignupEvent::DuplicateCheckResolved { email, outcome },
            ) if pending == email => Self::resolve_duplicate_check(state, email, intent, outcome),
            (WizardPhase::Submitting, SignupEvent::SubmissionSucceeded) => {
                let mut state = state;
                state.phase = WizardPhase::Completed;
                state.error = None;
                (state, vec![SignupAction::ClearCheckpoint])
            }
            (WizardPhase::Submitting, SignupEvent::SubmissionFailed { message }) => {
                let mut state = state;
                state.phase = WizardPhase::Editing;
                state.error = Some(SignupError::SubmissionFailed { message });
                (state, Vec::new())
            }
            // Busy phases and stale results leave the state untouched.
            (_, _) => (state, Vec::new()),
        }
    }

    fn edit(
        mut state: WizardState,
        name: String,
        value: Option<FieldValue>,
    ) -> (WizardState, Vec<SignupAction>) {
        if value.is_some() && WizardCheckpoint::is_reserved(&name) {
            state.error = Some(SignupError::Validation {
                step: state.current_step,
                issues: vec![FieldIssue::invalid(name)],
            });
            return (state, Vec::new());
        }

        if name == ROLE_FIELD
            && state.current_step != StepId::RoleSelect
            && state.field_values.get(ROLE_FIELD) != value.as_ref()
        {
            state.error = Some(SignupError::RoleLocked);
            return (state, Vec::new());
        }

        match value {
            Some(value) => {
                state.field_values.set(name, value);
            }
            None => {
                state.field_values.remove(&name);
            }
        }
        // An edit invalidates any pending duplicate check.
        state.phase = WizardPhase::Editing;
        state.error = None;
        (state, vec![SignupAction::PersistCheckpoint])
    }

    fn next(mut state: WizardState) -> (WizardState, Vec<SignupAction>) {
        let role = state.role();
        let step = state.current_step;

        if step.is_last(role) {
            state.error = Some(SignupError::NotAvailable {
                step,
                action: "next".to_string(),
            });
            return (state, Vec::new());
        }
        if let Err(issues) = step.validate(role, &state.field_values) {
            state.error = Some(SignupError::Validation { step, issues });
            return (state, Vec::new());
        }
        if step == StepId::RoleSelect {
            return Self::begin_duplicate_check(state, CheckIntent::Advance);
        }
        Self::advance(state)
    }

    fn back(mut state: WizardState) -> (WizardState, Vec<SignupAction>) {
        let Some(previous) = state.current_step.previous(state.role()) else {
            return (state, Vec::new());
        };
        state.current_step = previous;
        state.error = None;
        (state, vec![SignupAction::PersistCheckpoint])
    }

    fn submit(mut state: WizardState) -> (WizardState, Vec<SignupAction>) {
        let step = state.current_step;
        if step != StepId::Account {
            state.error = Some(SignupError::NotAvailable {
                step,
                action: "submit".to_string(),
            });
            return (state, Vec::new());
        }
        if let Err(issues) = step.validate(state.role(), &state.field_values) {
            state.error = Some(SignupError::Validation { step, issues });
            return (state, Vec::new());
        }
        Self::begin_duplicate_check(state, CheckIntent::Submit)
    }

    fn begin_duplicate_check(
        mut state: WizardState,
        intent: CheckIntent,
    ) -> (WizardState, Vec<SignupAction>) {
        let email = state
            .field_values
            .text(EMAIL_FIELD)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        state.phase = WizardPhase::CheckingDuplicate {
            email: email.clone(),
            intent,
        };
        state.error = None;
        (state, vec![SignupAction::CheckDuplicateAccount { email }])
    }

    fn resolve_duplicate_check(
        mut state: WizardState,
        email: String,
        intent: CheckIntent,
        outcome: DuplicateCheckOutcome,
    ) -> (WizardState, Vec<SignupAction>) {
        state.phase = WizardPhase::Editing;
        match outcome {
            DuplicateCheckOutcome::Exists => {
                state.error = Some(SignupError::AccountExists { email });
                (state, Vec::new())
            }
            DuplicateCheckOutcome::CheckFailed { message } => {
                state.error = Some(SignupError::DuplicateCheckFailed { message });
                (state, Vec::new())
            }
            DuplicateCheckOutcome::NotExists => match intent {
                CheckIntent::Advance => Self::advance(state),
                CheckIntent::Submit => match state.role() {
                    Some(role) => {
                        let values = state.field_values.clone();
                        state.phase = WizardPhase::Submitting;
                        state.error = None;
                        (state, vec![SignupAction::CreateAccount { role, values }])
                    }
                    None => {
                        state.error = Some(SignupError::Validation {
                            step: state.current_step,
                            issues: vec![FieldIssue::missing(ROLE_FIELD)],
                        });
                        (state, Vec::new())
                    }
                },
            },
        }
    }

    fn advance(mut state: WizardState) -> (WizardState, Vec<SignupAction>) {
        let step = state.current_step;
        match step.next(state.role()) {
            Some(next) => {
                state.current_step = next;
                state.error = None;
                (state, vec![SignupAction::PersistCheckpoint])
            }
            None => {
                state.error = Some(SignupError::NotAvailable {
                    step,
                    action: "next".to_string(),
                });
                (state, Vec::new())
            }
        }
    }
}
