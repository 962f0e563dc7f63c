//! Signup domain module.
//!
//! This module defines the multi-step signup wizard: roles, the role → step
//! table, field values, per-step validity predicates, the checkpoint model and
//! the pure state machine that ties them together.

pub mod checkpoint;
pub mod error;
pub mod fields;
pub mod role;
pub mod state;
pub mod state_machine;
pub mod step;
pub mod validation;

pub use checkpoint::{WizardCheckpoint, CHECKPOINT_KEY, CHECKPOINT_RETENTION_MS};
pub use error::SignupError;
pub use fields::{FieldValue, FieldValues, FileRef, LatLng, LocationValue, Place};
pub use role::{Role, UnknownRole};
pub use state::{CheckIntent, WizardPhase, WizardState};
pub use state_machine::{SignupAction, SignupEvent, SignupStateMachine};
pub use step::{steps_for, StepId, StepSpec};
pub use validation::{FieldIssue, IssueKind};
