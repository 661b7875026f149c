//! In-memory backends for tests, demos and small datasets

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use ontoquery_core::{
    enumerate_type_paths, Direction, ObjectData, ObjectType, OntologyManager, RelationType,
    RelationTypePath, ViewData,
};
use serde_json::Value;

use crate::dsl;
use crate::error::{StorageError, StorageResult};
use crate::traits::{SearchHit, SearchIndex, ViewFilter, ViewStore};

/// Branch used when a request names none
pub const DEFAULT_BRANCH: &str = "main";

fn lock_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Database(format!("Lock error: {}", e))
}

/// In-memory search index: named document collections evaluated with the
/// DSL evaluator
pub struct MemorySearchIndex {
    indexes: RwLock<HashMap<String, Vec<ObjectData>>>,
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert_documents(&self, index: &str, docs: Vec<ObjectData>) -> StorageResult<()> {
        let mut indexes = self.indexes.write().map_err(lock_err)?;
        indexes.entry(index.to_string()).or_default().extend(docs);
        Ok(())
    }
}

impl Default for MemorySearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn search(&self, index: &str, dsl: &Value, limit: usize) -> StorageResult<Vec<SearchHit>> {
        let indexes = self.indexes.read().map_err(lock_err)?;
        let docs = indexes
            .get(index)
            .ok_or_else(|| StorageError::Index(format!("Index not found: {}", index)))?;

        let hits = dsl::search(dsl, docs, limit)?
            .into_iter()
            .map(|(score, doc)| SearchHit {
                score,
                source: doc.clone(),
            })
            .collect::<Vec<_>>();
        tracing::debug!("Index {} search: {} hits", index, hits.len());
        Ok(hits)
    }

    async fn count(&self, index: &str, dsl: &Value) -> StorageResult<u64> {
        let indexes = self.indexes.read().map_err(lock_err)?;
        let docs = indexes
            .get(index)
            .ok_or_else(|| StorageError::Index(format!("Index not found: {}", index)))?;
        Ok(dsl::search(dsl, docs, usize::MAX)?.len() as u64)
    }
}

/// In-memory view store; evaluates the DSL form of the filter
pub struct MemoryViewStore {
    views: RwLock<HashMap<String, Vec<ObjectData>>>,
}

impl MemoryViewStore {
    pub fn new() -> Self {
        Self {
            views: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert_rows(&self, view_id: &str, rows: Vec<ObjectData>) -> StorageResult<()> {
        let mut views = self.views.write().map_err(lock_err)?;
        views.entry(view_id.to_string()).or_default().extend(rows);
        Ok(())
    }
}

impl Default for MemoryViewStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ViewStore for MemoryViewStore {
    async fn get_view_data_by_id(
        &self,
        view_id: &str,
        filter: &ViewFilter,
        limit: usize,
    ) -> StorageResult<ViewData> {
        let views = self.views.read().map_err(lock_err)?;
        let rows = views
            .get(view_id)
            .ok_or_else(|| StorageError::ViewNotFound(view_id.to_string()))?;

        let matched: Vec<ObjectData> = dsl::search(&filter.dsl, rows, limit)?
            .into_iter()
            .map(|(_, row)| row.clone())
            .collect();
        tracing::debug!("View {} lookup: {} rows", view_id, matched.len());
        Ok(ViewData::new(matched))
    }
}

#[derive(Debug, Default)]
struct Schema {
    object_types: Vec<ObjectType>,
    relation_types: Vec<RelationType>,
}

/// In-memory ontology manager keyed by knowledge network and branch
pub struct MemoryOntology {
    schemas: RwLock<HashMap<(String, String), Schema>>,
}

fn branch_key(kn_id: &str, branch: &str) -> (String, String) {
    let branch = if branch.is_empty() { DEFAULT_BRANCH } else { branch };
    (kn_id.to_string(), branch.to_string())
}

impl MemoryOntology {
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_object_type(&self, kn_id: &str, branch: &str, ot: ObjectType) -> StorageResult<()> {
        let mut schemas = self.schemas.write().map_err(lock_err)?;
        let schema = schemas.entry(branch_key(kn_id, branch)).or_default();
        schema.object_types.retain(|o| o.id != ot.id);
        schema.object_types.push(ot);
        Ok(())
    }

    pub fn add_relation_type(&self, kn_id: &str, branch: &str, rt: RelationType) -> StorageResult<()> {
        let mut schemas = self.schemas.write().map_err(lock_err)?;
        let schema = schemas.entry(branch_key(kn_id, branch)).or_default();
        schema.relation_types.retain(|r| r.id != rt.id);
        schema.relation_types.push(rt);
        Ok(())
    }

    pub fn object_types(&self, kn_id: &str, branch: &str) -> StorageResult<Vec<ObjectType>> {
        let schemas = self.schemas.read().map_err(lock_err)?;
        Ok(schemas
            .get(&branch_key(kn_id, branch))
            .map(|s| s.object_types.clone())
            .unwrap_or_default())
    }

    pub fn relation_types(&self, kn_id: &str, branch: &str) -> StorageResult<Vec<RelationType>> {
        let schemas = self.schemas.read().map_err(lock_err)?;
        Ok(schemas
            .get(&branch_key(kn_id, branch))
            .map(|s| s.relation_types.clone())
            .unwrap_or_default())
    }
}

impl Default for MemoryOntology {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OntologyManager for MemoryOntology {
    async fn get_object_type(
        &self,
        kn_id: &str,
        branch: &str,
        object_type_id: &str,
    ) -> ontoquery_core::Result<Option<ObjectType>> {
        Ok(self
            .object_types(kn_id, branch)?
            .into_iter()
            .find(|o| o.id == object_type_id))
    }

    async fn get_relation_type(
        &self,
        kn_id: &str,
        branch: &str,
        relation_type_id: &str,
    ) -> ontoquery_core::Result<Option<RelationType>> {
        Ok(self
            .relation_types(kn_id, branch)?
            .into_iter()
            .find(|r| r.id == relation_type_id))
    }

    async fn relation_type_paths(
        &self,
        kn_id: &str,
        branch: &str,
        source_object_type_id: &str,
        direction: Direction,
        path_length: usize,
    ) -> ontoquery_core::Result<Vec<RelationTypePath>> {
        let relation_types = self.relation_types(kn_id, branch)?;
        let paths = enumerate_type_paths(source_object_type_id, &relation_types, direction, path_length);
        tracing::debug!(
            "Enumerated {} type paths from {} ({:?}, length {})",
            paths.len(),
            source_object_type_id,
            direction,
            path_length
        );
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontoquery_core::Mapping;
    use serde_json::json;

    fn docs() -> Vec<ObjectData> {
        vec![
            dsl::as_object(json!({"id": 1, "age": 17})).unwrap(),
            dsl::as_object(json!({"id": 2, "age": 30})).unwrap(),
            dsl::as_object(json!({"id": 3, "age": 45})).unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_index_search_and_count() {
        let index = MemorySearchIndex::new();
        index.insert_documents("people", docs()).unwrap();

        let dsl = json!({"range": {"age": {"gte": 18}}});
        let hits = index.search("people", &dsl, 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source["id"], json!(2));
        assert_eq!(index.count("people", &dsl).await.unwrap(), 2);

        let err = index.search("missing", &dsl, 10).await.unwrap_err();
        assert!(matches!(err, StorageError::Index(_)));
    }

    #[tokio::test]
    async fn test_view_store_filters_rows() {
        let views = MemoryViewStore::new();
        views.insert_rows("v1", docs()).unwrap();

        let filter = ViewFilter {
            dsl: json!({"terms": {"id": [1, 3]}}),
            sql: "\"id\" IN (1, 3)".into(),
        };
        let data = views.get_view_data_by_id("v1", &filter, 100).await.unwrap();
        assert_eq!(data.rows.len(), 2);

        assert!(matches!(
            views.get_view_data_by_id("v2", &filter, 100).await,
            Err(StorageError::ViewNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ontology_lookups_and_paths() {
        let ontology = MemoryOntology::new();
        ontology
            .add_object_type("kn1", "", ObjectType::new("ot1", "ot1"))
            .unwrap();
        ontology
            .add_relation_type(
                "kn1",
                "main",
                RelationType::direct("rt1", "rt1", "ot1", "ot2", vec![Mapping::new("id", "ref")]),
            )
            .unwrap();

        assert!(ontology.get_object_type("kn1", "main", "ot1").await.unwrap().is_some());
        assert!(ontology.get_object_type("kn1", "dev", "ot1").await.unwrap().is_none());
        assert!(ontology.get_relation_type("kn1", "", "rt1").await.unwrap().is_some());

        let paths = ontology
            .relation_type_paths("kn1", "", "ot1", Direction::Forward, 2)
            .await
            .unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].object_types, vec!["ot1", "ot2"]);
    }
}
