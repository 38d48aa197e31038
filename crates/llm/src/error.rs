//! Language-model client error types.

use thiserror::Error;

/// LLM operation errors.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    #[error("stream error: {0}")]
    Stream(String),
}

/// Result type for LLM operations.
pub type LlmResult<T> = std::result::Result<T, LlmError>;
