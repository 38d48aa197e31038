//! Semantic-search client.

use crate::error::{RetrievalError, RetrievalResult};
use async_trait::async_trait;
use lantern_core::config::SearchConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One search invocation against the code corpus.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub corpus: String,
    pub rewrite_query: bool,
    pub top_k: u32,
    pub reranking: bool,
    pub score_threshold: f32,
}

/// A chunk of retrieved source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
}

/// One scored file hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub filename: String,
    pub score: f32,
    #[serde(default)]
    pub content: Vec<Chunk>,
}

/// Search service response envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<SearchHit>,
}

/// Access to the semantic-search service.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> RetrievalResult<SearchResponse>;
}

/// HTTP implementation of [`SearchClient`].
pub struct HttpSearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSearchClient {
    pub fn new(config: &SearchConfig) -> RetrievalResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(&self, request: &SearchRequest) -> RetrievalResult<SearchResponse> {
        let url = format!("{}/search", self.base_url);
        let mut builder = self.http.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(RetrievalError::Service {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
