//! Ontoquery Core - ontology model and subgraph traversal
//!
//! This crate provides the ontology data types, the condition wire format,
//! the mapping resolver and the quota-bounded traversal engine. Backends plug
//! in through the [`OntologyManager`] and [`ObjectSource`] traits.

pub mod access;
pub mod cancel;
pub mod condition;
pub mod error;
pub mod limits;
pub mod mapping;
pub mod object_type;
pub mod path;
pub mod quota;
pub mod relation_type;
pub mod traversal;
pub mod value;

pub use access::{ObjectPage, ObjectQuery, ObjectSource, OntologyManager, ViewData, ViewQuery};
pub use cancel::{CancelHandle, CancelSignal};
pub use condition::{CondCfg, Operation, ValueOptCfg, ALL_FIELDS, VALUE_FROM_CONST};
pub use error::{Error, Result};
pub use limits::ValidationError;
pub use object_type::{
    DataProperty, DataSource, IndexConfig, ObjectData, ObjectType, PropertyType,
};
pub use path::{
    enumerate_type_paths, LevelObject, Relation, RelationPath, RelationTypePath, TypeEdge,
};
pub use quota::PathQuotaManager;
pub use relation_type::{
    Direction, EdgeDirection, InDirectMapping, Mapping, MappingRules, RelationType,
};
pub use traversal::{
    BatchQueryState, BranchError, SubgraphEngine, SubgraphQuery, SubgraphResult, TraversalConfig,
};
