//! Backend contracts for search indexes and backing views

use async_trait::async_trait;
use ontoquery_core::{ObjectData, ViewData};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageResult;

/// One document returned by a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: f32,
    /// Stored document, keyed by physical field name
    pub source: ObjectData,
}

/// Search index access
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Documents of `index` matching the DSL query, best first
    async fn search(&self, index: &str, dsl: &Value, limit: usize) -> StorageResult<Vec<SearchHit>>;

    /// Number of documents matching the DSL query
    async fn count(&self, index: &str, dsl: &Value) -> StorageResult<u64>;
}

/// Filter for a view lookup, rendered for both backends. Stores use
/// whichever form they can evaluate; an empty `sql` has no relational form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewFilter {
    pub dsl: Value,
    #[serde(default)]
    pub sql: String,
}

impl ViewFilter {
    pub fn match_all() -> Self {
        Self {
            dsl: serde_json::json!({"match_all": {}}),
            sql: String::new(),
        }
    }
}

/// Backing view access
#[async_trait]
pub trait ViewStore: Send + Sync {
    /// Rows of the view matching `filter`
    async fn get_view_data_by_id(
        &self,
        view_id: &str,
        filter: &ViewFilter,
        limit: usize,
    ) -> StorageResult<ViewData>;
}
