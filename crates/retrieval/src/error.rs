//! Retrieval error types.

use thiserror::Error;

/// Retrieval operation errors. These never reach the client; the caller
/// degrades to an empty context.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search service error ({status}): {body}")]
    Service { status: u16, body: String },

    #[error("invalid search response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Result type for retrieval operations.
pub type RetrievalResult<T> = std::result::Result<T, RetrievalError>;
