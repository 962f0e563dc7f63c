//! Adapters that expose use cases through core ports.

mod local_duplicate_check;

pub use local_duplicate_check::LocalDuplicateAccountCheck;
