//! Ontoquery Storage - Backends for the traversal engine
//!
//! Search index and view store contracts, in-memory and SQLite
//! implementations, and the object service that routes object queries to
//! the right backend.

#![allow(clippy::result_large_err)]

pub mod dataset;
pub mod dsl;
pub mod error;
pub mod memory;
pub mod objects;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use dataset::{Backends, Dataset};
pub use error::{StorageError, StorageResult};
pub use memory::{MemoryOntology, MemorySearchIndex, MemoryViewStore, DEFAULT_BRANCH};
pub use objects::ObjectService;
pub use traits::{SearchHit, SearchIndex, ViewFilter, ViewStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteViewStore;
