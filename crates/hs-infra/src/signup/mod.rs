mod checkpoint_repo;
mod http_duplicate_check;

pub use checkpoint_repo::{FileCheckpointRepository, DEFAULT_CHECKPOINT_FILE};
pub use http_duplicate_check::HttpDuplicateAccountChecker;
