//! Chat client trait and request types.

use crate::error::LlmResult;
use async_trait::async_trait;
use futures::Stream;
use lantern_core::ChatRole;
use serde::Serialize;
use std::pin::Pin;

/// A boxed stream of text deltas from a streaming completion.
pub type ChunkStream = Pin<Box<dyn Stream<Item = LlmResult<String>> + Send>>;

/// One conversational turn sent to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// One completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Access to a messages-style completion API.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run a completion and return the model's full text reply.
    async fn complete(&self, request: &ChatRequest) -> LlmResult<String>;

    /// Run a streaming completion. The returned stream yields text deltas
    /// in arrival order and ends after the terminal frame.
    async fn stream(&self, request: &ChatRequest) -> LlmResult<ChunkStream>;
}
