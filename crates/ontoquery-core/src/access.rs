//! Collaborator contracts the traversal engine depends on
//!
//! Implementations live in `ontoquery-storage` (in-memory, SQLite) or in
//! adapters to remote services.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::condition::CondCfg;
use crate::error::Result;
use crate::object_type::{ObjectData, ObjectType};
use crate::path::RelationTypePath;
use crate::relation_type::{Direction, RelationType};

/// Schema lookups owned by the ontology manager
#[async_trait]
pub trait OntologyManager: Send + Sync {
    async fn get_object_type(
        &self,
        kn_id: &str,
        branch: &str,
        object_type_id: &str,
    ) -> Result<Option<ObjectType>>;

    async fn get_relation_type(
        &self,
        kn_id: &str,
        branch: &str,
        relation_type_id: &str,
    ) -> Result<Option<RelationType>>;

    /// Type-level paths leaving `source_object_type_id`
    async fn relation_type_paths(
        &self,
        kn_id: &str,
        branch: &str,
        source_object_type_id: &str,
        direction: Direction,
        path_length: usize,
    ) -> Result<Vec<RelationTypePath>>;
}

/// Instance query for one object type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectQuery {
    pub kn_id: String,
    #[serde(default)]
    pub branch: String,
    pub object_type: ObjectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<CondCfg>,
    pub limit: usize,
    /// Count every match, not just the returned page; may cost the backend
    /// a second query
    #[serde(default)]
    pub with_total: bool,
}

/// Instances returned for an object query, keyed by property name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectPage {
    pub objects: Vec<ObjectData>,
    /// Matching instances in the backend when `with_total` was asked for,
    /// otherwise the page size
    pub total_count: u64,
}

/// Row query against a backing view
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<CondCfg>,
    pub limit: usize,
}

/// Rows returned by a view lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewData {
    pub rows: Vec<ObjectData>,
}

impl ViewData {
    pub fn new(rows: Vec<ObjectData>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Backend-agnostic access to object instances and backing views.
///
/// This is the single entry point the traversal engine uses to fetch data,
/// whether an object type is stored in a search index or a view.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    async fn get_objects(&self, query: &ObjectQuery) -> Result<ObjectPage>;

    async fn get_view_data(&self, view_id: &str, query: &ViewQuery) -> Result<ViewData>;
}
