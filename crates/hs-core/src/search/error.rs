/// Failures reported by a search backend.
///
/// Messages carry the backend's own wording so callers can surface them as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchIndexError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("search request timed out")]
    Timeout,

    #[error("invalid response from search service: {0}")]
    Decode(String),
}

impl SearchIndexError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SearchIndexError::NotFound(_))
    }
}
