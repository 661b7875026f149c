//! JSON dataset loader: schema, index documents and view rows for one
//! knowledge network, wired into ready-to-use backends

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use ontoquery_condition::{ConditionCompiler, NoVectorizer, StaticVectorizer, Vectorizer};
use ontoquery_core::{ObjectData, ObjectType, RelationType, SubgraphEngine, TraversalConfig};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::memory::{MemoryOntology, MemorySearchIndex, MemoryViewStore, DEFAULT_BRANCH};
use crate::objects::ObjectService;
use crate::traits::ViewStore;

/// On-disk dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub kn_id: String,

    #[serde(default)]
    pub branch: String,

    #[serde(default)]
    pub object_types: Vec<ObjectType>,

    #[serde(default)]
    pub relation_types: Vec<RelationType>,

    /// Documents per search index name
    #[serde(default)]
    pub indexes: BTreeMap<String, Vec<ObjectData>>,

    /// Rows per backing view id
    #[serde(default)]
    pub views: BTreeMap<String, Vec<ObjectData>>,

    /// Precomputed query embeddings for knn conditions
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub embeddings: HashMap<String, Vec<f32>>,
}

/// Backends built from a dataset
pub struct Backends<V = MemoryViewStore> {
    pub kn_id: String,
    pub branch: String,
    pub ontology: Arc<MemoryOntology>,
    pub objects: Arc<ObjectService<MemorySearchIndex, V>>,
}

impl<V: ViewStore + 'static> Backends<V> {
    pub fn compiler(&self) -> &ConditionCompiler {
        self.objects.compiler()
    }

    pub fn engine(&self, config: TraversalConfig) -> SubgraphEngine {
        SubgraphEngine::new(self.ontology.clone(), self.objects.clone(), config)
    }
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let dataset = Self::from_json(&text)?;
        tracing::info!(
            "Loaded dataset {} from {}: {} object types, {} relation types",
            dataset.kn_id,
            path.display(),
            dataset.object_types.len(),
            dataset.relation_types.len()
        );
        Ok(dataset)
    }

    pub fn from_json(text: &str) -> StorageResult<Self> {
        let mut dataset: Self = serde_json::from_str(text)?;
        if dataset.branch.is_empty() {
            dataset.branch = DEFAULT_BRANCH.to_string();
        }
        dataset.check();
        Ok(dataset)
    }

    /// Warn about schema entries that cannot be traversed
    fn check(&self) {
        for ot in &self.object_types {
            if ot.search_index().is_none() && ot.view_id().is_none() {
                tracing::warn!("Object type {} has neither a search index nor a data view", ot.id);
            }
            if ot.primary_keys.is_empty() {
                tracing::warn!("Object type {} has no primary keys", ot.id);
            }
        }
        for rt in &self.relation_types {
            for endpoint in [&rt.source_object_type_id, &rt.target_object_type_id] {
                if !self.object_types.iter().any(|o| &o.id == endpoint) {
                    tracing::warn!("Relation type {} references unknown object type {}", rt.id, endpoint);
                }
            }
        }
    }

    fn compiler(&self) -> ConditionCompiler {
        let vectorizer: Arc<dyn Vectorizer> = if self.embeddings.is_empty() {
            Arc::new(NoVectorizer)
        } else {
            Arc::new(StaticVectorizer::new(self.embeddings.clone()))
        };
        ConditionCompiler::new(vectorizer)
    }

    fn ontology(&self) -> StorageResult<MemoryOntology> {
        let ontology = MemoryOntology::new();
        for ot in &self.object_types {
            ontology.add_object_type(&self.kn_id, &self.branch, ot.clone())?;
        }
        for rt in &self.relation_types {
            ontology.add_relation_type(&self.kn_id, &self.branch, rt.clone())?;
        }
        Ok(ontology)
    }

    fn search_index(&self) -> StorageResult<MemorySearchIndex> {
        let index = MemorySearchIndex::new();
        for (name, docs) in &self.indexes {
            index.insert_documents(name, docs.clone())?;
        }
        Ok(index)
    }

    fn with_views<V: ViewStore + 'static>(self, views: V) -> StorageResult<Backends<V>> {
        let objects = ObjectService::new(
            Arc::new(self.search_index()?),
            Arc::new(views),
            self.compiler(),
        );
        Ok(Backends {
            ontology: Arc::new(self.ontology()?),
            objects: Arc::new(objects),
            kn_id: self.kn_id,
            branch: self.branch,
        })
    }

    /// Backends with views held in memory
    pub fn into_backends(self) -> StorageResult<Backends> {
        let views = MemoryViewStore::new();
        for (id, rows) in &self.views {
            views.insert_rows(id, rows.clone())?;
        }
        self.with_views(views)
    }

    /// Backends with views materialised as SQLite tables, in memory when no
    /// path is given
    #[cfg(feature = "sqlite")]
    pub fn into_sqlite_backends(
        self,
        path: Option<&Path>,
    ) -> StorageResult<Backends<crate::sqlite::SqliteViewStore>> {
        let store = match path {
            Some(path) => crate::sqlite::SqliteViewStore::open(path)?,
            None => crate::sqlite::SqliteViewStore::in_memory()?,
        };
        for (id, rows) in &self.views {
            store.create_view(id, rows)?;
        }
        self.with_views(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontoquery_core::OntologyManager;

    const DATASET: &str = r#"{
        "kn_id": "kn1",
        "object_types": [
            {"id": "ot1", "primary_keys": ["id"], "status": {"index_available": true, "index": "idx_ot1"}},
            {"id": "ot2", "primary_keys": ["target_id"], "data_source": {"type": "data_view", "id": "v_ot2"}}
        ],
        "relation_types": [
            {
                "id": "rt1",
                "source_object_type_id": "ot1",
                "target_object_type_id": "ot2",
                "type": "direct",
                "mapping_rules": [{"source_property": "id", "target_property": "target_id"}]
            }
        ],
        "indexes": {"idx_ot1": [{"id": 123}]},
        "views": {"v_ot2": [{"target_id": 123}]}
    }"#;

    #[tokio::test]
    async fn test_load_defaults_branch() {
        let dataset = Dataset::from_json(DATASET).unwrap();
        assert_eq!(dataset.branch, "main");

        let backends = dataset.into_backends().unwrap();
        let ot = backends
            .ontology
            .get_object_type("kn1", "main", "ot2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ot.view_id(), Some("v_ot2"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        std::fs::write(&path, DATASET).unwrap();
        let dataset = Dataset::load(&path).unwrap();
        assert_eq!(dataset.object_types.len(), 2);

        assert!(Dataset::load(dir.path().join("missing.json")).is_err());
    }
}
