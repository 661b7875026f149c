//! Request limits and defaults for subgraph queries

/// Start objects fetched when the request gives no positive limit (100)
pub const DEFAULT_LIMIT: usize = 100;

/// Hard cap on start objects per request (10000)
pub const MAX_LIMIT: usize = 10_000;

/// Relation paths materialised per request when no quota is given (1000)
pub const DEFAULT_TOTAL_LIMIT: usize = 1000;

/// Frontier objects folded into one backend query (50)
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Candidates fetched per batch query (10000)
pub const MAX_CANDIDATES_PER_BATCH: usize = 10_000;

/// Concurrently expanding type-paths / batch queries (4)
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Maximum hops of a type-level path (10)
pub const MAX_PATH_LENGTH: usize = 10;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    PathLengthTooLarge { length: usize, max: usize },
    ZeroPathLength,
    EmptyObjectTypeId,
    EmptyKnowledgeNetworkId,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PathLengthTooLarge { length, max } => {
                write!(f, "Path length too large: {} (max {})", length, max)
            }
            Self::ZeroPathLength => write!(f, "Path length must be at least 1"),
            Self::EmptyObjectTypeId => write!(f, "Source object type id cannot be empty"),
            Self::EmptyKnowledgeNetworkId => write!(f, "Knowledge network id cannot be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for crate::error::Error {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Validate path length
pub fn validate_path_length(length: usize) -> Result<(), ValidationError> {
    if length == 0 {
        return Err(ValidationError::ZeroPathLength);
    }
    if length > MAX_PATH_LENGTH {
        return Err(ValidationError::PathLengthTooLarge {
            length,
            max: MAX_PATH_LENGTH,
        });
    }
    Ok(())
}

/// Page size for start objects; non-positive falls back to the default
pub fn effective_limit(limit: i64) -> usize {
    if limit <= 0 {
        DEFAULT_LIMIT
    } else {
        (limit as usize).min(MAX_LIMIT)
    }
}

/// Total quota; absent uses the default, non-positive means zero
pub fn effective_total_limit(total_limit: Option<i64>) -> usize {
    match total_limit {
        None => DEFAULT_TOTAL_LIMIT,
        Some(n) if n <= 0 => 0,
        Some(n) => n as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path_length() {
        assert!(validate_path_length(1).is_ok());
        assert!(validate_path_length(MAX_PATH_LENGTH).is_ok());
        assert_eq!(validate_path_length(0), Err(ValidationError::ZeroPathLength));
        assert!(validate_path_length(MAX_PATH_LENGTH + 1).is_err());
    }

    #[test]
    fn test_effective_limit_falls_back() {
        assert_eq!(effective_limit(0), DEFAULT_LIMIT);
        assert_eq!(effective_limit(-5), DEFAULT_LIMIT);
        assert_eq!(effective_limit(7), 7);
        assert_eq!(effective_limit(1_000_000), MAX_LIMIT);
    }

    #[test]
    fn test_effective_total_limit() {
        assert_eq!(effective_total_limit(None), DEFAULT_TOTAL_LIMIT);
        assert_eq!(effective_total_limit(Some(0)), 0);
        assert_eq!(effective_total_limit(Some(-1)), 0);
        assert_eq!(effective_total_limit(Some(25)), 25);
    }
}
