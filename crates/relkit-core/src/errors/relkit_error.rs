use super::{ConsolidationError, SchemaError, StorageError};

/// Top-level error for every relkit crate.
#[derive(Debug, thiserror::Error)]
pub enum RelkitError {
    #[error("{entity_type} with pk {pk} not found")]
    EntityNotFound { entity_type: String, pk: i64 },

    #[error("{count} {entity_type} entities matched where at most one was expected")]
    MultipleObjectsReturned { entity_type: String, count: usize },

    #[error("validation failed: {reason}")]
    ValidationError { reason: String },

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("cache error: {reason}")]
    CacheError { reason: String },

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("schema error: {0}")]
    SchemaError(#[from] SchemaError),

    #[error("consolidation error: {0}")]
    ConsolidationError(#[from] ConsolidationError),
}

impl RelkitError {
    /// True when the underlying storage failure is a uniqueness violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            RelkitError::StorageError(StorageError::UniqueViolation { .. })
        )
    }
}

pub type RelkitResult<T> = Result<T, RelkitError>;
