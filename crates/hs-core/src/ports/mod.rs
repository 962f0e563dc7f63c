//! Port interfaces for the application layer
//!
//! Ports define the contract between the use cases in `hs-app` and the
//! adapters in `hs-infra`. Use cases only ever see these traits.

mod account;
mod checkpoint;
mod clock;
mod search_index;


pub use account::{AccountRegistrationPort, DuplicateAccountCheckPort, IdentityLookupPort};
pub use checkpoint::CheckpointStorePort;
pub use clock::ClockPort;
pub use search_index::SearchIndexPort;
