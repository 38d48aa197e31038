//! Explanation endpoints.

use crate::error::ApiResult;
use crate::handlers::require_json;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use lantern_pipeline::{ExplainRequest, ExplainResponse};
use serde_json::json;
use std::convert::Infallible;

/// POST /api/explain - Buffered explanation.
pub async fn explain(
    State(state): State<AppState>,
    body: Result<Json<ExplainRequest>, JsonRejection>,
) -> ApiResult<Json<ExplainResponse>> {
    let request = require_json(body)?;
    let response = state.orchestrator.explain(&request).await?;
    Ok(Json(response))
}

/// POST /api/explain/stream - Streaming explanation over server-sent
/// events.
///
/// Exactly one `metadata` event precedes any content; the stream ends
/// with `done`, or with `error` on a mid-stream failure. A client that
/// disconnects simply drops the stream; there is nothing further to
/// clean up.
pub async fn explain_stream(
    State(state): State<AppState>,
    body: Result<Json<ExplainRequest>, JsonRejection>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let request = require_json(body)?;
    let (metadata, mut chunks) = state.orchestrator.explain_stream(&request).await?;

    let stream = async_stream::stream! {
        let metadata = serde_json::to_string(&metadata)
            .unwrap_or_else(|_| "{}".to_string());
        yield Ok(Event::default().event("metadata").data(metadata));

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(text) => yield Ok(Event::default().data(text)),
                Err(e) => {
                    tracing::warn!(error = %e, "explanation stream failed mid-flight");
                    let payload = json!({ "error": e.to_string() }).to_string();
                    yield Ok(Event::default().event("error").data(payload));
                    return;
                }
            }
        }

        yield Ok(Event::default().event("done").data("{}"));
    };

    Ok(Sse::new(stream))
}
