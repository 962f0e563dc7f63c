//! Search index port
//!
//! One method per upstream operation. Each call is a single request; retries
//! and batching are not the port's concern.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::search::{
    IndexName, IndexRecord, ObjectId, SaveObjectsResult, SearchIndexError, SearchPage,
    SearchParams, TaskAck,
};

#[async_trait]
pub trait SearchIndexPort: Send + Sync {
    /// Add or replace records. Records without an `objectID` get one assigned.
    async fn save_objects(
        &self,
        index: &IndexName,
        records: Vec<IndexRecord>,
    ) -> Result<SaveObjectsResult, SearchIndexError>;

    async fn get_object(
        &self,
        index: &IndexName,
        object_id: &ObjectId,
    ) -> Result<IndexRecord, SearchIndexError>;

    /// Merge attributes into an existing record. Never creates a record.
    async fn partial_update_object(
        &self,
        index: &IndexName,
        object_id: &ObjectId,
        partial: &Map<String, Value>,
    ) -> Result<TaskAck, SearchIndexError>;

    async fn delete_object(
        &self,
        index: &IndexName,
        object_id: &ObjectId,
    ) -> Result<TaskAck, SearchIndexError>;

    async fn search(
        &self,
        index: &IndexName,
        params: &SearchParams,
    ) -> Result<SearchPage, SearchIndexError>;

    /// Delete every record matching `filters`.
    async fn delete_by(&self, index: &IndexName, filters: &str)
        -> Result<TaskAck, SearchIndexError>;

    /// Delete every record in the index, keeping the index itself.
    async fn clear_objects(&self, index: &IndexName) -> Result<TaskAck, SearchIndexError>;
}
