use hs_core::search::IndexName;

/// Settings injected into [`super::IndexSync`] at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSyncConfig {
    /// Index used when a request does not name one.
    pub default_index: Option<IndexName>,
}

impl IndexSyncConfig {
    /// A blank default index is treated as no default.
    pub fn new(default_index: Option<&str>) -> Self {
        Self {
            default_index: default_index.and_then(IndexName::new),
        }
    }
}
