//! Local in-memory search index.
//!
//! Deterministic stand-in for the hosted service, used for development and
//! tests. Records are kept per index in `objectID` order; queries match
//! case-insensitive substrings of string attributes and filters use the
//! grammar from [`hs_core::search::FilterExpr`].

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use hs_core::ports::SearchIndexPort;
use hs_core::search::{
    FilterExpr, IndexName, IndexRecord, ObjectId, SaveObjectsResult, SearchIndexError,
    SearchPage, SearchParams, TaskAck,
};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_HITS_PER_PAGE: u32 = 20;
pub const MAX_HITS_PER_PAGE: u32 = 1000;

const OBJECT_NOT_FOUND: &str = "ObjectID does not exist";

type Records = BTreeMap<ObjectId, IndexRecord>;

#[derive(Default)]
pub struct InMemorySearchIndex {
    indexes: RwLock<HashMap<IndexName, Records>>,
    next_task_id: AtomicI64,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored in `index`.
    pub async fn len(&self, index: &IndexName) -> usize {
        self.indexes
            .read()
            .await
            .get(index)
            .map_or(0, BTreeMap::len)
    }

    fn task_id(&self) -> Option<i64> {
        Some(self.next_task_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn ack(&self, object_id: Option<&ObjectId>) -> TaskAck {
        TaskAck {
            task_id: self.task_id(),
            object_id: object_id.cloned(),
        }
    }
}

fn parse_filters(filters: &str) -> Result<FilterExpr, SearchIndexError> {
    FilterExpr::parse(filters).map_err(|e| SearchIndexError::InvalidRequest(e.to_string()))
}

fn contains_text(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|item| contains_text(item, needle)),
        Value::Object(map) => map.values().any(|item| contains_text(item, needle)),
        _ => false,
    }
}

/// Every query word must appear somewhere in the record.
fn matches_query(record: &Map<String, Value>, query: &str) -> bool {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .all(|word| {
            record
                .iter()
                .any(|(key, value)| key != IndexRecord::OBJECT_ID && contains_text(value, &word))
        })
}

#[async_trait]
impl SearchIndexPort for InMemorySearchIndex {
    async fn save_objects(
        &self,
        index: &IndexName,
        records: Vec<IndexRecord>,
    ) -> Result<SaveObjectsResult, SearchIndexError> {
        let mut indexes = self.indexes.write().await;
        let stored = indexes.entry(index.clone()).or_default();

        let mut object_ids = Vec::with_capacity(records.len());
        for mut record in records {
            let object_id = match record.object_id() {
                Some(id) => id,
                None => {
                    let generated = ObjectId::new(Uuid::new_v4().to_string()).ok_or_else(|| {
                        SearchIndexError::Decode("generated empty objectID".into())
                    })?;
                    record.set_object_id(&generated);
                    generated
                }
            };
            stored.insert(object_id.clone(), record);
            object_ids.push(object_id);
        }
        debug!(index = %index, count = object_ids.len(), "Saved records in memory");

        Ok(SaveObjectsResult {
            object_ids,
            task_id: self.task_id(),
        })
    }

    async fn get_object(
        &self,
        index: &IndexName,
        object_id: &ObjectId,
    ) -> Result<IndexRecord, SearchIndexError> {
        self.indexes
            .read()
            .await
            .get(index)
            .and_then(|records| records.get(object_id))
            .cloned()
            .ok_or_else(|| SearchIndexError::NotFound(OBJECT_NOT_FOUND.to_string()))
    }

    async fn partial_update_object(
        &self,
        index: &IndexName,
        object_id: &ObjectId,
        partial: &Map<String, Value>,
    ) -> Result<TaskAck, SearchIndexError> {
        let mut indexes = self.indexes.write().await;
        let record = indexes
            .get_mut(index)
            .and_then(|records| records.get_mut(object_id))
            .ok_or_else(|| SearchIndexError::NotFound(OBJECT_NOT_FOUND.to_string()))?;
        record.merge(partial);
        Ok(self.ack(Some(object_id)))
    }

    async fn delete_object(
        &self,
        index: &IndexName,
        object_id: &ObjectId,
    ) -> Result<TaskAck, SearchIndexError> {
        if let Some(records) = self.indexes.write().await.get_mut(index) {
            records.remove(object_id);
        }
        Ok(self.ack(Some(object_id)))
    }

    async fn search(
        &self,
        index: &IndexName,
        params: &SearchParams,
    ) -> Result<SearchPage, SearchIndexError> {
        let started = Instant::now();
        let filter = params
            .filters
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .map(parse_filters)
            .transpose()?;
        let hits_per_page = params
            .hits_per_page
            .unwrap_or(DEFAULT_HITS_PER_PAGE)
            .clamp(1, MAX_HITS_PER_PAGE);
        let page = params.page.unwrap_or(0);

        let indexes = self.indexes.read().await;
        let matching: Vec<&IndexRecord> = indexes
            .get(index)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter(|record| matches_query(record.attributes(), &params.query))
            .filter(|record| {
                filter
                    .as_ref()
                    .map_or(true, |f| f.matches(record.attributes()))
            })
            .collect();

        let nb_hits = matching.len();
        let nb_pages = nb_hits.div_ceil(hits_per_page as usize);
        let hits = matching
            .into_iter()
            .skip(page as usize * hits_per_page as usize)
            .take(hits_per_page as usize)
            .map(|record| record.clone().into_json())
            .collect();

        Ok(SearchPage {
            hits,
            nb_hits: nb_hits as u64,
            page,
            nb_pages: nb_pages as u32,
            hits_per_page,
            processing_time_ms: started.elapsed().as_millis() as u64,
            query: params.query.clone(),
            extra: Map::new(),
        })
    }

    async fn delete_by(
        &self,
        index: &IndexName,
        filters: &str,
    ) -> Result<TaskAck, SearchIndexError> {
        let filter = parse_filters(filters)?;
        if let Some(records) = self.indexes.write().await.get_mut(index) {
            let before = records.len();
            records.retain(|_, record| !filter.matches(record.attributes()));
            debug!(index = %index, removed = before - records.len(), "Deleted records by filter");
        }
        Ok(self.ack(None))
    }

    async fn clear_objects(&self, index: &IndexName) -> Result<TaskAck, SearchIndexError> {
        if let Some(records) = self.indexes.write().await.get_mut(index) {
            records.clear();
        }
        Ok(self.ack(None))
    }
}
