use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::search::ids::ObjectId;

/// A record stored in an index: a free-form JSON object whose `objectID`
/// attribute identifies it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexRecord(Map<String, Value>);

impl IndexRecord {
    pub const OBJECT_ID: &'static str = "objectID";

    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    /// Accepts JSON objects only.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// The record's identifier. Numeric IDs are accepted and read as text.
    pub fn object_id(&self) -> Option<ObjectId> {
        match self.0.get(Self::OBJECT_ID)? {
            Value::String(id) => ObjectId::new(id.as_str()),
            Value::Number(n) => ObjectId::new(n.to_string()),
            _ => None,
        }
    }

    pub fn set_object_id(&mut self, id: &ObjectId) {
        self.0
            .insert(Self::OBJECT_ID.to_string(), Value::String(id.to_string()));
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Shallow merge: each attribute of `partial` replaces the stored one.
    /// The identifier is never changed by a merge.
    pub fn merge(&mut self, partial: &Map<String, Value>) {
        for (key, value) in partial {
            if key == Self::OBJECT_ID {
                continue;
            }
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.0)
    }
}

/// Acknowledgement of a batch save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveObjectsResult {
    #[serde(rename = "objectIDs", default)]
    pub object_ids: Vec<ObjectId>,
    #[serde(rename = "taskID", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
}

/// Acknowledgement of a write that does not return data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskAck {
    #[serde(rename = "taskID", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
    #[serde(rename = "objectID", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_replaces_attributes_but_keeps_identifier() {
        let mut record = IndexRecord::from_json(json!({"objectID": "x", "foo": 1, "bar": [1]}))
            .unwrap();
        let partial = json!({"foo": 2, "objectID": "y", "baz": true});

        record.merge(partial.as_object().unwrap());

        assert_eq!(
            record.into_json(),
            json!({"objectID": "x", "foo": 2, "bar": [1], "baz": true})
        );
    }

    #[test]
    fn numeric_object_id_is_read_as_text() {
        let record = IndexRecord::from_json(json!({"objectID": 42})).unwrap();
        assert_eq!(record.object_id().unwrap().as_str(), "42");
        assert!(IndexRecord::from_json(json!([1, 2])).is_none());
    }
}
