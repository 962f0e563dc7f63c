//! Homestead application layer
//!
//! Use cases that drive the signup wizard and the search index through the
//! ports defined in `hs-core`.

pub mod adapters;
pub mod usecases;

pub use usecases::index_sync::{IndexSync, IndexSyncConfig, IndexSyncError};
pub use usecases::signup::{SignupOrchestrator, SignupOrchestratorError};
pub use usecases::users::{CheckUserExists, CheckUserExistsError};
