//! Intent parsing.
//!
//! A free-form question plus URL hints becomes a typed [`ParsedIntent`].
//! Deterministic pre-processing runs before the model: an admin entry URL
//! identifies a product record exactly, and that identification overrides
//! whatever the model decides. A rule-based classifier stands in whenever
//! the model reply cannot be used.

use lantern_core::config::LlmConfig;
use lantern_core::{ChatRole, Domain, ParsedIntent, QuestionType};
use lantern_llm::{ChatClient, ChatMessage, ChatRequest};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static ADMIN_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/admin/entries/products/(\d+)-(.+)$").expect("admin url pattern compiles")
});

static IMPORT_QUESTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\batdw\b|\batlas\b|\bimport(?:ed)?\b.*\bproduct\b|\bproduct\b.*\bimport")
        .expect("import question pattern compiles")
});

/// A product identified from an admin editor URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminProduct {
    pub entry_id: i64,
    pub name: String,
}

/// Match an admin entry URL of the products section. The slug is
/// title-cased back into a display name.
pub fn admin_product_from_uri(uri: &str) -> Option<AdminProduct> {
    let captures = ADMIN_URL_PATTERN.captures(uri.trim())?;
    let entry_id = captures.get(1)?.as_str().parse().ok()?;
    let name = title_case_slug(captures.get(2)?.as_str());
    Some(AdminProduct { entry_id, name })
}

fn title_case_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the first balanced JSON object from free text. Handles braces
/// inside string literals and escape sequences; model replies often wrap
/// the object in prose or code fences.
pub fn extract_first_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Rule-based domain classifier used when the model reply is unusable.
pub fn classify_fallback(question: &str) -> Domain {
    if IMPORT_QUESTION_PATTERN.is_match(question) {
        Domain::AtdwImport
    } else {
        Domain::PageComponent
    }
}

const INTENT_SYSTEM_PROMPT: &str = "\
You classify questions from website managers of a tourism site platform.\n\
Reply with a single JSON object and nothing else:\n\
{\"domain\": \"page_component\" | \"atdw_import\" | \"general\",\n \
\"pageUri\": string or null, \"pageName\": string or null,\n \
\"componentType\": string, \"productNames\": [string],\n \
\"atdwProductId\": string or null,\n \
\"questionType\": \"why_included\" | \"why_excluded\" | \"what_shows\" | \"why_order\" | \"general\"}\n\
Domains: page_component is about what a page section displays;\n\
atdw_import is about products imported (or not) from the ATDW/Atlas feed;\n\
general is anything else. componentType defaults to \"products\".\n\
List every product or business name mentioned in productNames.";

/// Model reply shape; every field is optional so a partial reply still
/// contributes what it has.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelIntent {
    domain: Option<String>,
    page_uri: Option<String>,
    page_name: Option<String>,
    component_type: Option<String>,
    #[serde(default)]
    product_names: Vec<String>,
    atdw_product_id: Option<String>,
    question_type: Option<String>,
}

fn domain_from_str(raw: &str) -> Option<Domain> {
    match raw {
        "page_component" => Some(Domain::PageComponent),
        "atdw_import" => Some(Domain::AtdwImport),
        "general" => Some(Domain::General),
        _ => None,
    }
}

fn question_type_from_str(raw: &str) -> Option<QuestionType> {
    match raw {
        "why_included" => Some(QuestionType::WhyIncluded),
        "why_excluded" => Some(QuestionType::WhyExcluded),
        "what_shows" => Some(QuestionType::WhatShows),
        "why_order" => Some(QuestionType::WhyOrder),
        "general" => Some(QuestionType::General),
        _ => None,
    }
}

/// Parse a question into a typed intent. Never fails: a dead or confused
/// model degrades to the rule-based classifier.
pub async fn parse_intent(
    chat: &dyn ChatClient,
    llm: &LlmConfig,
    question: &str,
    page_uri: Option<&str>,
) -> ParsedIntent {
    let admin = page_uri.and_then(admin_product_from_uri);

    let model = match query_model(chat, llm, question, page_uri).await {
        Some(model) => model,
        None => {
            tracing::debug!("intent model unusable, using rule-based classifier");
            ModelIntent::default()
        }
    };

    let mut intent = ParsedIntent {
        domain: model
            .domain
            .as_deref()
            .and_then(domain_from_str)
            .unwrap_or_else(|| classify_fallback(question)),
        page_uri: model
            .page_uri
            .filter(|uri| !uri.trim().is_empty())
            .or_else(|| page_uri.map(str::to_string)),
        page_name: model.page_name.filter(|name| !name.trim().is_empty()),
        component_type: model
            .component_type
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.to_lowercase())
            .unwrap_or_else(|| "products".to_string()),
        product_names: model.product_names,
        atdw_product_id: model.atdw_product_id.filter(|id| !id.trim().is_empty()),
        question_type: model
            .question_type
            .as_deref()
            .and_then(question_type_from_str)
            .unwrap_or(QuestionType::General),
        raw_question: question.to_string(),
    };

    // The admin URL identifies the record exactly; it overrides the model.
    if let Some(admin) = admin {
        intent.domain = Domain::AtdwImport;
        let mut names = vec![admin.name.clone()];
        for name in intent.product_names.drain(..) {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                names.push(name);
            }
        }
        intent.product_names = names;
        tracing::debug!(entry_id = admin.entry_id, "admin URL forced import domain");
    } else {
        // Dedupe model names case-insensitively, keeping first spellings.
        let mut names: Vec<String> = Vec::new();
        for name in intent.product_names.drain(..) {
            if !name.trim().is_empty() && !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                names.push(name);
            }
        }
        intent.product_names = names;
    }

    intent
}

async fn query_model(
    chat: &dyn ChatClient,
    llm: &LlmConfig,
    question: &str,
    page_uri: Option<&str>,
) -> Option<ModelIntent> {
    let mut user = format!("Question: {question}");
    if let Some(uri) = page_uri {
        user.push_str(&format!("\nPage URL: {uri}"));
    }

    let request = ChatRequest {
        system: Some(INTENT_SYSTEM_PROMPT.to_string()),
        messages: vec![ChatMessage {
            role: ChatRole::User,
            content: user,
        }],
        max_tokens: llm.intent_max_tokens,
        temperature: llm.intent_temperature,
    };

    let reply = match chat.complete(&request).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(error = %e, "intent model call failed");
            return None;
        }
    };

    let json = extract_first_json(&reply)?;
    match serde_json::from_str::<ModelIntent>(json) {
        Ok(model) => Some(model),
        Err(e) => {
            tracing::warn!(error = %e, "intent model reply did not parse");
            None
        }
    }
}
