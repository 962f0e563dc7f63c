use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query parameters. Parameters this crate does not interpret are kept in
/// `extra` and forwarded to the backend unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits_per_page: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchParams {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_filters(mut self, filters: impl Into<String>) -> Self {
        self.filters = Some(filters.into());
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub hits: Vec<Value>,
    #[serde(default)]
    pub nb_hits: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub nb_pages: u32,
    #[serde(default)]
    pub hits_per_page: u32,
    #[serde(rename = "processingTimeMS", default)]
    pub processing_time_ms: u64,
    #[serde(default)]
    pub query: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_parameters_are_forwarded() {
        let params: SearchParams = serde_json::from_value(json!({
            "query": "double wide",
            "hitsPerPage": 5,
            "attributesToRetrieve": ["title"]
        }))
        .unwrap();

        assert_eq!(params.hits_per_page, Some(5));
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"query": "double wide", "hitsPerPage": 5, "attributesToRetrieve": ["title"]})
        );
    }

    #[test]
    fn page_keeps_backend_specific_fields() {
        let page: SearchPage = serde_json::from_value(json!({
            "hits": [{"objectID": "1"}],
            "nbHits": 1,
            "page": 0,
            "nbPages": 1,
            "hitsPerPage": 20,
            "processingTimeMS": 2,
            "query": "",
            "exhaustiveNbHits": true
        }))
        .unwrap();

        assert_eq!(page.nb_hits, 1);
        assert_eq!(page.processing_time_ms, 2);
        assert_eq!(page.extra.get("exhaustiveNbHits"), Some(&json!(true)));
    }
}
