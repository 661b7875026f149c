//! Error types for Ontoquery Core

use thiserror::Error;

/// Result type alias using Ontoquery's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Ontoquery error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Object type not found: {0}")]
    ObjectTypeNotFound(String),

    #[error("Relation type not found: {0}")]
    RelationTypeNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("View lookup failed for {view_id}: {reason}")]
    ViewLookupFailed { view_id: String, reason: String },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Malformed input; never retried and surfaced verbatim
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::PropertyNotFound(_) | Self::BadRequest(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ObjectTypeNotFound(_) | Self::RelationTypeNotFound(_)
        )
    }

    /// Failures of an external collaborator during traversal
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::ViewLookupFailed { .. } | Self::Timeout(_)
        )
    }
}
