//! Anthropic-compatible messages API client.

use crate::client::{ChatClient, ChatMessage, ChatRequest, ChunkStream};
use crate::error::{LlmError, LlmResult};
use crate::sse::{Delta, FrameDecoder, StreamEvent};
use async_trait::async_trait;
use futures::StreamExt;
use lantern_core::config::LlmConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_VERSION: &str = "2023-06-01";

/// HTTP client for the messages API.
pub struct AnthropicChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl AnthropicChatClient {
    pub fn new(config: &LlmConfig) -> LlmResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    fn builder(&self, body: &WireRequest) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(body)
    }

    fn wire_request(&self, request: &ChatRequest, stream: bool) -> WireRequest {
        WireRequest {
            model: self.model.clone(),
            messages: request.messages.clone(),
            system: request.system.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: stream.then_some(true),
        }
    }

    async fn try_complete(&self, body: &WireRequest) -> LlmResult<String> {
        let response = self.builder(body).send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: WireResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("{e}: {text}")))?;
        let content = parsed
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        Ok(content)
    }
}

#[async_trait]
impl ChatClient for AnthropicChatClient {
    async fn complete(&self, request: &ChatRequest) -> LlmResult<String> {
        let body = self.wire_request(request, false);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }
            match self.try_complete(&body).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if attempt < self.max_retries {
                        tracing::warn!(
                            attempt = attempt + 1,
                            retries = self.max_retries,
                            error = %e,
                            "model request failed, retrying"
                        );
                    }
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| LlmError::InvalidResponse("no attempts were made".to_string())))
    }

    async fn stream(&self, request: &ChatRequest) -> LlmResult<ChunkStream> {
        let body = self.wire_request(request, true);
        let response = self.builder(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let mut bytes = response.bytes_stream();
        let stream = async_stream::try_stream! {
            let mut decoder = FrameDecoder::new();
            'outer: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(LlmError::Transport)?;
                let text = String::from_utf8_lossy(&chunk);
                for frame in decoder.feed(&text) {
                    if frame.data.is_empty() {
                        continue;
                    }
                    match decode_frame(&frame.data)? {
                        FrameAction::Delta(text) => yield text,
                        FrameAction::Stop => break 'outer,
                        FrameAction::Skip => {}
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

enum FrameAction {
    Delta(String),
    Stop,
    Skip,
}

fn decode_frame(data: &str) -> LlmResult<FrameAction> {
    let event: StreamEvent = serde_json::from_str(data)
        .map_err(|e| LlmError::Stream(format!("bad event frame: {e}")))?;
    match event {
        StreamEvent::ContentBlockDelta {
            delta: Delta::TextDelta { text },
        } => Ok(FrameAction::Delta(text)),
        StreamEvent::Error { error } => Err(LlmError::Stream(error.message)),
        StreamEvent::MessageStop => Ok(FrameAction::Stop),
        _ => Ok(FrameAction::Skip),
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}
