mod algolia;
mod memory;

pub use algolia::{AlgoliaConfig, AlgoliaSearchIndex, DEFAULT_TIMEOUT};
pub use memory::{InMemorySearchIndex, DEFAULT_HITS_PER_PAGE, MAX_HITS_PER_PAGE};
