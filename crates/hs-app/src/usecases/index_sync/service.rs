use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, info_span, Instrument};

use hs_core::ports::SearchIndexPort;
use hs_core::search::{
    IndexName, IndexRecord, ObjectId, SaveObjectsResult, SearchIndexError, SearchPage,
    SearchParams, TaskAck,
};

use super::config::IndexSyncConfig;
use super::error::IndexSyncError;

/// Thin façade over the search backend.
///
/// Every argument is validated before the backend is touched. Each operation
/// issues one request, except `partial_update` which reads the record first
/// so a missing record is reported instead of created.
pub struct IndexSync {
    index: Arc<dyn SearchIndexPort>,
    config: IndexSyncConfig,
}

impl IndexSync {
    pub fn new(index: Arc<dyn SearchIndexPort>, config: IndexSyncConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &IndexSyncConfig {
        &self.config
    }

    /// Explicit non-blank name, else the configured default.
    pub fn resolve_index(&self, index: Option<&str>) -> Result<IndexName, IndexSyncError> {
        index
            .and_then(IndexName::new)
            .or_else(|| self.config.default_index.clone())
            .ok_or(IndexSyncError::IndexNameRequired)
    }

    pub async fn save_objects(
        &self,
        index: Option<&str>,
        objects: Vec<Value>,
    ) -> Result<SaveObjectsResult, IndexSyncError> {
        let records = objects
            .into_iter()
            .enumerate()
            .map(|(position, object)| {
                IndexRecord::from_json(object).ok_or(IndexSyncError::InvalidRecord { position })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let index = self.resolve_index(index)?;

        let span = info_span!(
            "usecase.index_sync.save_objects",
            index = %index,
            count = records.len()
        );
        async {
            let result = self.index.save_objects(&index, records).await?;
            info!(saved = result.object_ids.len(), task_id = ?result.task_id, "objects saved");
            Ok(result)
        }
        .instrument(span)
        .await
    }

    pub async fn get_object(
        &self,
        index: Option<&str>,
        object_id: &str,
    ) -> Result<IndexRecord, IndexSyncError> {
        let object_id = ObjectId::new(object_id).ok_or(IndexSyncError::ObjectIdRequired)?;
        let index = self.resolve_index(index)?;

        self.index
            .get_object(&index, &object_id)
            .instrument(info_span!(
                "usecase.index_sync.get_object",
                index = %index,
                object_id = %object_id
            ))
            .await
            .map_err(not_found_as_missing_object)
    }

    /// Merge `partial` into an existing record and return the merged record.
    pub async fn partial_update(
        &self,
        index: Option<&str>,
        object_id: &str,
        partial: Option<&Value>,
    ) -> Result<IndexRecord, IndexSyncError> {
        let (object_id, partial) = match (ObjectId::new(object_id), partial) {
            (Some(id), Some(Value::Object(partial))) if !partial.is_empty() => (id, partial),
            _ => return Err(IndexSyncError::PartialRequired),
        };
        let index = self.resolve_index(index)?;

        let span = info_span!(
            "usecase.index_sync.partial_update",
            index = %index,
            object_id = %object_id
        );
        async {
            let mut record = self
                .index
                .get_object(&index, &object_id)
                .await
                .map_err(not_found_as_missing_object)?;
            let ack = self
                .index
                .partial_update_object(&index, &object_id, partial)
                .await
                .map_err(not_found_as_missing_object)?;
            debug!(task_id = ?ack.task_id, "partial update acknowledged");

            record.merge(partial);
            Ok(record)
        }
        .instrument(span)
        .await
    }

    /// Deleting a record that does not exist succeeds.
    pub async fn delete_object(
        &self,
        index: Option<&str>,
        object_id: &str,
    ) -> Result<TaskAck, IndexSyncError> {
        let object_id = ObjectId::new(object_id).ok_or(IndexSyncError::ObjectIdRequired)?;
        let index = self.resolve_index(index)?;

        let span = info_span!(
            "usecase.index_sync.delete_object",
            index = %index,
            object_id = %object_id
        );
        async {
            match self.index.delete_object(&index, &object_id).await {
                Ok(ack) => Ok(ack),
                Err(SearchIndexError::NotFound(message)) => {
                    debug!(%message, "object already absent");
                    Ok(TaskAck {
                        task_id: None,
                        object_id: Some(object_id.clone()),
                    })
                }
                Err(err) => Err(err.into()),
            }
        }
        .instrument(span)
        .await
    }

    pub async fn search(
        &self,
        index: Option<&str>,
        params: &SearchParams,
    ) -> Result<SearchPage, IndexSyncError> {
        let index = self.resolve_index(index)?;

        let span = info_span!("usecase.index_sync.search", index = %index);
        async {
            let page = self.index.search(&index, params).await?;
            debug!(nb_hits = page.nb_hits, page = page.page, "search completed");
            Ok(page)
        }
        .instrument(span)
        .await
    }

    pub async fn delete_by(
        &self,
        index: Option<&str>,
        filters: Option<&str>,
    ) -> Result<TaskAck, IndexSyncError> {
        let filters = filters
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .ok_or(IndexSyncError::FiltersRequired)?;
        let index = self.resolve_index(index)?;

        let span = info_span!("usecase.index_sync.delete_by", index = %index, filters);
        async {
            let ack = self.index.delete_by(&index, filters).await?;
            info!(task_id = ?ack.task_id, "records deleted by filter");
            Ok(ack)
        }
        .instrument(span)
        .await
    }

    /// Remove every record, keeping the index.
    pub async fn clear(&self, index: Option<&str>) -> Result<TaskAck, IndexSyncError> {
        let index = self.resolve_index(index)?;

        let span = info_span!("usecase.index_sync.clear", index = %index);
        async {
            let ack = self.index.clear_objects(&index).await?;
            info!(task_id = ?ack.task_id, "index cleared");
            Ok(ack)
        }
        .instrument(span)
        .await
    }
}

fn not_found_as_missing_object(err: SearchIndexError) -> IndexSyncError {
    match err {
        SearchIndexError::NotFound(message) => IndexSyncError::ObjectNotFound(message),
        other => IndexSyncError::Upstream(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hs_infra::search::InMemorySearchIndex;
    use mockall::mock;
    use serde_json::{json, Map};

    mock! {
        SearchIndex {}

        #[async_trait]
        impl SearchIndexPort for SearchIndex {
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
            async fn delete_by(&self, index: &IndexName, filters: &str)
                -> Result<TaskAck, SearchIndexError>;
            async fn clear_objects(&self, index: &IndexName) -> Result<TaskAck, SearchIndexError>;
        }
    }

    /// A backend that must never be called.
    fn untouched() -> MockSearchIndex {
        let mut index = MockSearchIndex::new();
        index.expect_save_objects().times(0);
        index.expect_get_object().times(0);
        index.expect_partial_update_object().times(0);
        index.expect_delete_object().times(0);
        index.expect_search().times(0);
        index.expect_delete_by().times(0);
        index.expect_clear_objects().times(0);
        index
    }

    fn sync_with(index: MockSearchIndex, default_index: Option<&str>) -> IndexSync {
        IndexSync::new(Arc::new(index), IndexSyncConfig::new(default_index))
    }

    fn in_memory() -> IndexSync {
        IndexSync::new(
            Arc::new(InMemorySearchIndex::new()),
            IndexSyncConfig::new(Some("listings")),
        )
    }

    #[tokio::test]
    async fn clear_without_any_index_is_rejected_locally() {
        let sync = sync_with(untouched(), None);

        let err = sync.clear(None).await.unwrap_err();

        assert_eq!(err, IndexSyncError::IndexNameRequired);
        assert_eq!(err.to_string(), "indexName required");
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn delete_by_without_filters_is_rejected_locally() {
        let sync = sync_with(untouched(), Some("listings"));

        for filters in [None, Some(""), Some("   ")] {
            let err = sync.delete_by(None, filters).await.unwrap_err();
            assert_eq!(err.to_string(), "filters required");
        }
    }

    #[tokio::test]
    async fn blank_ids_and_empty_partials_are_rejected_locally() {
        let sync = sync_with(untouched(), Some("listings"));

        assert_eq!(
            sync.get_object(None, "").await.unwrap_err(),
            IndexSyncError::ObjectIdRequired
        );
        assert_eq!(
            sync.delete_object(None, " ").await.unwrap_err(),
            IndexSyncError::ObjectIdRequired
        );
        for partial in [None, Some(json!({})), Some(json!([1, 2]))] {
            let err = sync
                .partial_update(None, "x", partial.as_ref())
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "objectID and partial data required");
        }
    }

    #[tokio::test]
    async fn non_object_records_are_rejected_locally() {
        let sync = sync_with(untouched(), Some("listings"));

        let err = sync
            .save_objects(None, vec![json!({"objectID": "a"}), json!("nope")])
            .await
            .unwrap_err();

        assert_eq!(err, IndexSyncError::InvalidRecord { position: 1 });
    }

    #[tokio::test]
    async fn explicit_index_wins_over_default() {
        let mut index = MockSearchIndex::new();
        index
            .expect_clear_objects()
            .withf(|index| index.as_str() == "archive")
            .times(1)
            .returning(|_| Ok(TaskAck::default()));

        let sync = sync_with(index, Some("listings"));
        sync.clear(Some("archive")).await.unwrap();
    }

    #[tokio::test]
    async fn upstream_errors_pass_through_verbatim() {
        let mut index = MockSearchIndex::new();
        index.expect_search().returning(|_, _| {
            Err(SearchIndexError::Upstream {
                status: 500,
                message: "Index listings is locked".into(),
            })
        });

        let err = sync_with(index, Some("listings"))
            .search(None, &SearchParams::query("cabin"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Index listings is locked");
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn delete_of_missing_object_is_tolerated() {
        let mut index = MockSearchIndex::new();
        index
            .expect_delete_object()
            .returning(|_, _| Err(SearchIndexError::NotFound("ObjectID does not exist".into())));

        let ack = sync_with(index, Some("listings"))
            .delete_object(None, "gone")
            .await
            .unwrap();

        assert_eq!(ack.object_id, ObjectId::new("gone"));
    }

    #[tokio::test]
    async fn saved_object_can_be_fetched() {
        let sync = in_memory();

        sync.save_objects(None, vec![json!({"objectID": "x", "foo": 1})])
            .await
            .unwrap();
        let record = sync.get_object(None, "x").await.unwrap();

        assert_eq!(record.get("foo"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn partial_update_merges_into_existing_record() {
        let sync = in_memory();
        sync.save_objects(None, vec![json!({"objectID": "x", "foo": 1, "bar": "keep"})])
            .await
            .unwrap();

        let merged = sync
            .partial_update(None, "x", Some(&json!({"foo": 2})))
            .await
            .unwrap();

        assert_eq!(
            merged.into_json(),
            json!({"objectID": "x", "foo": 2, "bar": "keep"})
        );
        let stored = sync.get_object(None, "x").await.unwrap();
        assert_eq!(stored.get("foo"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn partial_update_of_missing_object_creates_nothing() {
        let sync = in_memory();

        let err = sync
            .partial_update(None, "ghost", Some(&json!({"foo": 2})))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(sync.get_object(None, "ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn partial_update_reads_then_writes_once() {
        let mut index = MockSearchIndex::new();
        index
            .expect_get_object()
            .times(1)
            .returning(|_, _| {
                Ok(IndexRecord::from_json(json!({"objectID": "x", "foo": 1})).unwrap())
            });
        index
            .expect_partial_update_object()
            .withf(|_, id, partial| id.as_str() == "x" && partial.get("foo") == Some(&json!(2)))
            .times(1)
            .returning(|_, _, _| Ok(TaskAck::default()));

        let merged = sync_with(index, Some("listings"))
            .partial_update(None, "x", Some(&json!({"foo": 2})))
            .await
            .unwrap();

        assert_eq!(merged.get("foo"), Some(&json!(2)));
    }
}
