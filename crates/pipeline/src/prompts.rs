//! Prompt composition for the explanation generator.
//!
//! The model sees human labels and plain-language settings, never internal
//! step names, file paths, or raw ids. Trace details and chat history are
//! trimmed to keep the prompt inside a predictable budget.

use lantern_core::component::{AtdwImportConfig, ComponentConfig, RelatedItem};
use lantern_core::trace::TraceStep;
use lantern_core::{ChatTurn, Domain, ParsedIntent};
use lantern_llm::ChatMessage;

/// Arrays longer than this render as a count placeholder.
const DETAIL_ARRAY_CAP: usize = 10;

/// Serialised detail payloads longer than this are dropped entirely.
const DETAIL_CHAR_CAP: usize = 400;

/// Total character budget for prior conversation turns.
const HISTORY_CHAR_BUDGET: usize = 3_000;

/// Per-message character cap before truncation with an ellipsis.
const MESSAGE_CHAR_CAP: usize = 500;

const SHARED_PERSONA: &str = "\
You are a friendly helper for website managers of a regional tourism site.\n\
Your reader is not technical. Talk about 'component settings', 'selected \
regions' and 'hand-picked products' in plain language.\n\
Never mention file names, function names, internal step names, database \
ids, or code. Never quote raw configuration keys.\n\
If the evidence below is thin or ambiguous, say what you can and ask one \
short clarifying question.\n\
Keep the whole answer to two or three short paragraphs.";

const PAGE_PERSONA: &str = "\
The question is about why a product does or does not appear in a page \
component. Walk through the component's settings in the order they are \
applied and point at the first setting that explains the outcome.";

const IMPORT_PERSONA: &str = "\
The question is about whether a product was imported from the state \
tourism database (ATDW). Explain what the import rules did with this \
record: region and postcode checks, category mapping, and the state of \
the website listing.";

/// The system prompt for a generation request.
pub fn system_prompt(domain: Domain) -> String {
    let variant = match domain {
        Domain::AtdwImport => IMPORT_PERSONA,
        Domain::PageComponent | Domain::General => PAGE_PERSONA,
    };
    format!("{SHARED_PERSONA}\n\n{variant}")
}

/// Everything the user prompt packs together.
pub struct PromptInputs<'a> {
    pub intent: &'a ParsedIntent,
    pub config_text: String,
    pub trace: &'a [TraceStep],
    pub code_context: &'a str,
    pub targets: &'a [RelatedItem],
}

/// Build the user prompt from the collected evidence.
pub fn build_user_prompt(inputs: &PromptInputs<'_>) -> String {
    let mut sections = Vec::new();

    sections.push(format!("Question: {}", inputs.intent.raw_question));
    if let Some(uri) = &inputs.intent.page_uri {
        sections.push(format!("Page: {uri}"));
    }
    if !inputs.targets.is_empty() {
        let names: Vec<&str> = inputs
            .targets
            .iter()
            .map(|item| item.title.as_str())
            .collect();
        sections.push(format!("Products asked about: {}", names.join(", ")));
    }

    if !inputs.config_text.is_empty() {
        sections.push(format!("Component settings:\n{}", inputs.config_text));
    }
    if !inputs.trace.is_empty() {
        sections.push(format!("What the platform did:\n{}", render_trace(inputs.trace)));
    }
    if !inputs.code_context.trim().is_empty() {
        sections.push(format!(
            "How the platform's logic works (for your background only, \
             do not quote):\n{}",
            inputs.code_context
        ));
    }

    sections.join("\n\n")
}

/// Render the trace with human labels and trimmed details.
pub fn render_trace(trace: &[TraceStep]) -> String {
    trace
        .iter()
        .map(|step| {
            let mut line = format!("- {}: {}", step.step.label(), step.description);
            if !step.product_ids.is_empty() {
                line.push_str(&format!(" [{} products]", step.count));
            }
            match step.target_present {
                Some(true) => line.push_str(" (asked-about product still included)"),
                Some(false) => line.push_str(" (asked-about product not included)"),
                None => {}
            }
            if let Some(details) = render_details(step) {
                line.push_str(&format!("\n  {details}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_details(step: &TraceStep) -> Option<String> {
    if step.details.is_empty() {
        return None;
    }
    let mut trimmed = serde_json::Map::new();
    for (key, value) in &step.details {
        let value = match value {
            serde_json::Value::Array(items) if items.len() > DETAIL_ARRAY_CAP => {
                serde_json::Value::String(format!("[{} items]", items.len()))
            }
            other => other.clone(),
        };
        trimmed.insert(key.clone(), value);
    }
    let serialized = serde_json::Value::Object(trimmed).to_string();
    if serialized.len() > DETAIL_CHAR_CAP {
        return None;
    }
    Some(serialized)
}

/// Describe a products component the way an author sees it.
pub fn render_component_config(config: &ComponentConfig) -> String {
    let mut lines = Vec::new();
    let list = |items: &[RelatedItem]| {
        items
            .iter()
            .map(|item| item.title.clone())
            .collect::<Vec<_>>()
            .join(", ")
    };

    if !config.categories.is_empty() {
        lines.push(format!("- Categories: {}", list(&config.categories)));
    }
    if !config.regions.is_empty() {
        lines.push(format!("- Regions: {}", list(&config.regions)));
    }
    if !config.tiers.is_empty() {
        lines.push(format!("- Tiers: {}", list(&config.tiers)));
    }
    if !config.taxonomy.is_empty() {
        lines.push(format!("- Experience types: {}", list(&config.taxonomy)));
    }
    if !config.explicit_products.is_empty() {
        lines.push(format!(
            "- Hand-picked products: {}",
            list(&config.explicit_products)
        ));
    }
    if !config.exclude_products.is_empty() {
        lines.push(format!(
            "- Excluded products: {}",
            list(&config.exclude_products)
        ));
    }
    lines.push(format!("- Shows up to {} products", config.limit));
    lines.push(format!("- Ordered: {}", config.order.as_str()));
    lines.join("\n")
}

/// Describe an import record snapshot.
pub fn render_import_config(config: &AtdwImportConfig) -> String {
    let mut lines = vec![format!(
        "- Record: {} ({})",
        config.product_name,
        if config.product_id.is_empty() {
            "not found"
        } else {
            &config.product_id
        }
    )];
    if let Some(status) = &config.atdw_status {
        lines.push(format!("- Provider status: {status}"));
    }
    lines.push(format!(
        "- Imported: {}",
        if config.imported { "yes" } else { "no" }
    ));
    if let Some(postcode) = &config.postcode {
        let place = config.city.as_deref().unwrap_or("unknown town");
        lines.push(format!("- Location: {place} {postcode}"));
    }
    if !config.matching_regions.is_empty() {
        lines.push(format!(
            "- Falls inside regions: {}",
            config.matching_regions.join(", ")
        ));
    }
    if !config.mapped_categories.is_empty() {
        lines.push(format!(
            "- Would be categorised as: {}",
            config.mapped_categories.join(", ")
        ));
    }
    if !config.unmapped_classifications.is_empty() {
        lines.push(format!(
            "- Provider types with no matching site category: {}",
            config.unmapped_classifications.join(", ")
        ));
    }
    if let Some(reason) = &config.reason {
        lines.push(format!("- Import note: {reason}"));
    }
    lines.join("\n")
}

/// Turn sanitised history into model messages within the character
/// budget. Individual messages are capped with an ellipsis; when the
/// running budget runs out, older messages drop first.
pub fn history_messages(history: &[ChatTurn]) -> Vec<ChatMessage> {
    let mut kept: Vec<ChatMessage> = Vec::new();
    let mut budget = HISTORY_CHAR_BUDGET;

    for turn in history.iter().rev() {
        let mut content = turn.content.clone();
        if content.chars().count() > MESSAGE_CHAR_CAP {
            content = content.chars().take(MESSAGE_CHAR_CAP).collect::<String>() + "…";
        }
        let cost = content.chars().count();
        if cost > budget {
            break;
        }
        budget -= cost;
        kept.push(ChatMessage {
            role: turn.role,
            content,
        });
    }

    kept.reverse();
    kept
}
