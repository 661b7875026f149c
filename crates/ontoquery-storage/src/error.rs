//! Storage error types

use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage-specific error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Index error: {0}")]
    Index(String),

    #[error("View not found: {0}")]
    ViewNotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Condition(#[from] ontoquery_condition::ConditionError),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] ::rusqlite::Error),
}

impl From<StorageError> for ontoquery_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Condition(e) => e.into(),
            StorageError::Serialization(e) => ontoquery_core::Error::Serialization(e),
            other => ontoquery_core::Error::Backend(other.to_string()),
        }
    }
}
