//! Content store error types.

use thiserror::Error;

/// Content store operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("schema incomplete for tenant {tenant}: {missing}")]
    SchemaIncomplete { tenant: String, missing: String },

    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Cache(#[from] lantern_cache::CacheError),

    #[error(transparent)]
    Core(#[from] lantern_core::Error),
}

/// Result type for content store operations.
pub type DbResult<T> = std::result::Result<T, DbError>;
