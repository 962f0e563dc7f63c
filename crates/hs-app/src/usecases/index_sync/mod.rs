//! Index synchronization façade.
//!
//! Validates requests locally, resolves the target index and forwards each
//! operation to the search backend as a single request.

mod config;
mod envelope;
mod error;
mod service;

pub use config::IndexSyncConfig;
pub use envelope::Envelope;
pub use error::IndexSyncError;
pub use service::IndexSync;
