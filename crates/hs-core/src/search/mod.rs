//! Search-index domain.
//!
//! Types shared by the index synchronization use cases and the search backends:
//! validated index and object identifiers, records, query parameters and
//! results, and the filter grammar understood by the local backend.

pub mod error;
pub mod filter;
pub mod ids;
pub mod params;
pub mod record;

pub use error::SearchIndexError;
pub use filter::{FilterExpr, FilterSyntaxError, NumericOp};
pub use ids::{IndexName, ObjectId};
pub use params::{SearchPage, SearchParams};
pub use record::{IndexRecord, SaveObjectsResult, TaskAck};
