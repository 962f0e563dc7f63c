//! Business logic use cases

pub mod index_sync;
pub mod signup;
pub mod users;
