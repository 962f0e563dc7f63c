//! # hs-core
//!
//! Core domain models and business rules for Homestead.
//!
//! This crate contains pure business logic without any infrastructure dependencies:
//! the signup wizard state machine, the search-index domain and the ports that
//! the infrastructure layer implements.

pub mod account;
pub mod config;
pub mod ports;
pub mod search;
pub mod signup;

// Re-export commonly used types at the crate root
pub use account::{DuplicateCheckOutcome, IdentityLookupError, MarketplaceUser, UserExistence};
pub use config::{AppConfig, ConfigError};
pub use search::{IndexName, ObjectId};
pub use signup::{FieldValue, FieldValues, Role, StepId, WizardState};
