//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid tenant identifier: {0:?}")]
    InvalidTenant(String),

    #[error("invalid origin mapping: {0:?}")]
    InvalidOrigin(String),

    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
