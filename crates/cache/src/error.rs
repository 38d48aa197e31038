//! Cache error types.

use thiserror::Error;

/// Cache operation errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache full: {entries} entries (max: {max})")]
    Full { entries: usize, max: usize },

    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
