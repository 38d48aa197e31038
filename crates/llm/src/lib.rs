//! Language-model client for Lantern.
//!
//! The generator talks to a messages-style completion API (system + user +
//! assistant turns, temperature, token cap) in two modes:
//! - Buffered: one request, one text reply
//! - Streaming: server-sent events decoded into text deltas
//!
//! The model itself is an external collaborator; this crate is transport
//! and decoding only.

pub mod anthropic;
pub mod client;
pub mod error;
pub mod sse;

pub use anthropic::AnthropicChatClient;
pub use client::{ChatClient, ChatMessage, ChatRequest, ChunkStream};
pub use error::{LlmError, LlmResult};
