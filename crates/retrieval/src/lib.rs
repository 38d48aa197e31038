//! Code-context retrieval for Lantern.
//!
//! Explanations are grounded in the platform's actual business logic by
//! retrieving relevant source chunks from an external semantic-search
//! service. This crate provides:
//! - The [`SearchClient`] trait and its HTTP implementation
//! - Query construction from a parsed intent and tenant hint
//! - Formatting of search hits into a single prompt-ready context block
//!
//! Retrieval is strictly best-effort: the public entry point returns an
//! empty context on any failure and never propagates an error.

pub mod client;
pub mod error;
pub mod query;

pub use client::{HttpSearchClient, SearchClient, SearchHit, SearchRequest, SearchResponse};
pub use error::{RetrievalError, RetrievalResult};
pub use query::build_query;

use lantern_core::config::SearchConfig;
use lantern_core::{ParsedIntent, Tenant};

/// Retrieve formatted code context for an intent.
///
/// Failures degrade to an empty string; the generator treats missing
/// context as "answer from the data snapshot alone".
pub async fn retrieve_context(
    client: &dyn SearchClient,
    config: &SearchConfig,
    intent: &ParsedIntent,
    tenant: Option<&Tenant>,
) -> String {
    let request = SearchRequest {
        query: build_query(intent, tenant),
        corpus: config.corpus.clone(),
        rewrite_query: true,
        top_k: config.top_k,
        reranking: true,
        score_threshold: config.score_threshold,
    };

    match client.search(&request).await {
        Ok(response) => format_context(&response),
        Err(e) => {
            tracing::warn!(error = %e, "code retrieval failed, continuing without context");
            String::new()
        }
    }
}

/// Join search hits into one text block of per-file sections.
pub fn format_context(response: &SearchResponse) -> String {
    let mut sections = Vec::with_capacity(response.data.len());
    for hit in &response.data {
        let chunks = hit
            .content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if chunks.trim().is_empty() {
            continue;
        }
        sections.push(format!(
            "--- {} (score: {:.2}) ---\n{}",
            hit.filename, hit.score, chunks
        ));
    }
    sections.join("\n\n")
}
