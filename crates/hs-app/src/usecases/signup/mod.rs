//! Signup use cases.
//!
//! This module exposes the signup orchestrator.

mod context;
pub mod orchestrator;

pub use orchestrator::{SignupOrchestrator, SignupOrchestratorError};
