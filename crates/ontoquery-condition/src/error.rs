//! Condition compiler error types

use thiserror::Error;

/// Result type alias for condition compilation
pub type ConditionResult<T> = std::result::Result<T, ConditionError>;

/// Structural validation failures. Never retried; surfaced verbatim.
#[derive(Error, Debug)]
pub enum ConditionError {
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("No eligible field for {operation} on {name}")]
    NoEligibleField { name: String, operation: String },

    #[error("Array value not allowed for {0}")]
    ArrayValueNotAllowed(String),

    #[error("Value must be a non-empty array for {0}")]
    ValueMustBeArray(String),

    #[error("Range value must be [from, to] for {0}")]
    InvalidRangeValue(String),

    #[error("Invalid value for {condition}: {reason}")]
    InvalidValue { condition: String, reason: String },

    #[error("Invalid match_type: {0}")]
    InvalidMatchType(String),

    #[error("Invalid limit_key: {0}")]
    InvalidLimitKey(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Unsupported value_from '{value_from}' for {condition}")]
    UnsupportedValueFrom { condition: String, value_from: String },

    #[error("Missing sub_conditions for {0}")]
    MissingSubConditions(String),

    #[error("Vectorizer error: {0}")]
    Vectorizer(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConditionError {
    pub(crate) fn invalid_value(condition: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            condition: condition.into(),
            reason: reason.into(),
        }
    }
}

impl From<ConditionError> for ontoquery_core::Error {
    fn from(err: ConditionError) -> Self {
        ontoquery_core::Error::Validation(err.to_string())
    }
}
