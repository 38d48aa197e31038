//! Pipeline error taxonomy.
//!
//! Only structural request errors and fatal database errors reach the
//! HTTP surface. Retrieval failures become an empty context and
//! generation failures become deterministic fallback prose before an
//! error could propagate.

use thiserror::Error;

/// Pipeline operation errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("bad tenant: {0}")]
    BadTenant(#[from] lantern_core::Error),

    #[error(transparent)]
    Db(#[from] lantern_db::DbError),

    #[error(transparent)]
    Cache(#[from] lantern_cache::CacheError),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
