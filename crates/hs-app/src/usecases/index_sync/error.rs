use hs_core::search::SearchIndexError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndexSyncError {
    #[error("indexName required")]
    IndexNameRequired,

    #[error("objectID required")]
    ObjectIdRequired,

    #[error("objectID and partial data required")]
    PartialRequired,

    #[error("filters required")]
    FiltersRequired,

    #[error("object at position {position} is not a JSON object")]
    InvalidRecord { position: usize },

    #[error("{0}")]
    ObjectNotFound(String),

    /// Backend failure, message passed through verbatim.
    #[error(transparent)]
    Upstream(#[from] SearchIndexError),
}

impl IndexSyncError {
    /// Rejected before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IndexSyncError::IndexNameRequired
                | IndexSyncError::ObjectIdRequired
                | IndexSyncError::PartialRequired
                | IndexSyncError::FiltersRequired
                | IndexSyncError::InvalidRecord { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexSyncError::ObjectNotFound(_))
    }
}
