//! # hs-infra
//!
//! Adapters implementing the `hs-core` ports: file-backed signup checkpoints,
//! the system clock, the hosted search service client, a local in-memory
//! search index and the marketplace Integration API client.

pub mod fs;
pub mod marketplace;
pub mod search;
pub mod signup;
pub mod time;

pub use time::SystemClock;
