//! Storage-specific error type wrapping sqlx errors.

use looprule_domain::error::LoopRuleError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to encode or decode a stored JSON value.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for LoopRuleError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_wrap_storage_error_as_loop_rule_storage_error() {
        let err: LoopRuleError = StorageError::from(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, LoopRuleError::Storage(_)));
    }
}
