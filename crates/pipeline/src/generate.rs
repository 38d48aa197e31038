//! Explanation generation.
//!
//! Wraps the chat client with the two delivery modes and the
//! deterministic fallback. The fallback paraphrases the trace so the user
//! always gets an answer, even with the model down.

use crate::prompts::{build_user_prompt, history_messages, system_prompt, PromptInputs};
use lantern_core::component::RelatedItem;
use lantern_core::config::LlmConfig;
use lantern_core::trace::TraceStep;
use lantern_core::{ChatTurn, Domain};
use lantern_llm::{ChatClient, ChatMessage, ChatRequest, ChunkStream};

/// Everything generation needs beyond the chat client.
pub struct GenerationContext<'a> {
    pub llm: &'a LlmConfig,
    pub domain: Domain,
    pub inputs: PromptInputs<'a>,
    pub history: &'a [ChatTurn],
}

fn chat_request(ctx: &GenerationContext<'_>) -> ChatRequest {
    let mut messages = history_messages(ctx.history);
    messages.push(ChatMessage::user(build_user_prompt(&ctx.inputs)));
    ChatRequest {
        system: Some(system_prompt(ctx.domain)),
        messages,
        max_tokens: ctx.llm.max_tokens,
        temperature: ctx.llm.temperature,
    }
}

/// Buffered generation: the model's text, or the deterministic fallback.
pub async fn generate(chat: &dyn ChatClient, ctx: &GenerationContext<'_>) -> String {
    let request = chat_request(ctx);
    match chat.complete(&request).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::warn!("model returned an empty explanation, using fallback");
            fallback_explanation(&ctx.inputs)
        }
        Err(e) => {
            tracing::warn!(error = %e, "generation failed, using fallback");
            fallback_explanation(&ctx.inputs)
        }
    }
}

/// Streaming generation. A failure to open the stream degrades to a
/// single-chunk stream carrying the fallback; mid-stream failures are the
/// caller's to surface as a terminal error event.
pub async fn generate_stream(chat: &dyn ChatClient, ctx: &GenerationContext<'_>) -> ChunkStream {
    let request = chat_request(ctx);
    match chat.stream(&request).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(error = %e, "model stream failed to open, using fallback");
            let fallback = fallback_explanation(&ctx.inputs);
            Box::pin(futures::stream::once(async move { Ok(fallback) }))
        }
    }
}

/// Deterministic trace paraphrase used when the model is unavailable.
pub fn fallback_explanation(inputs: &PromptInputs<'_>) -> String {
    let mut parts = vec![
        "I couldn't reach the assistant just now, so here is what the settings show."
            .to_string(),
    ];

    if !inputs.config_text.is_empty() {
        parts.push(format!("Current settings:\n{}", inputs.config_text));
    }

    if let Some(last) = inputs.trace.last() {
        if !last.product_ids.is_empty() || last.count > 0 {
            parts.push(format!(
                "After all settings are applied, {} products remain.",
                last.count
            ));
        } else {
            parts.push(format!("{}: {}", last.step.label(), last.description));
        }
    }

    if !inputs.targets.is_empty() {
        let names: Vec<&str> = inputs
            .targets
            .iter()
            .map(|item| item.title.as_str())
            .collect();
        if let Some(dropped_at) = first_absent_step(inputs.trace) {
            parts.push(format!(
                "{} drops out at: {}.",
                names.join(", "),
                dropped_at.step.label()
            ));
        } else if inputs
            .trace
            .last()
            .and_then(|step| step.target_present)
            .unwrap_or(false)
        {
            parts.push(format!(
                "{} is included in the final selection.",
                names.join(", ")
            ));
        }
    }

    parts.join("\n\n")
}

fn first_absent_step<'a>(trace: &'a [TraceStep]) -> Option<&'a TraceStep> {
    trace
        .iter()
        .find(|step| step.target_present == Some(false))
}

/// Resolve the asked-about names against the resolved target items for
/// prompt rendering; unresolved names are kept as zero-id placeholders so
/// the prompt still mentions them.
pub fn targets_for_prompt(names: &[String], resolved: &[RelatedItem]) -> Vec<RelatedItem> {
    if !resolved.is_empty() {
        return resolved.to_vec();
    }
    names
        .iter()
        .map(|name| RelatedItem::new(0, name.clone()))
        .collect()
}
