//! Generic block inspector.
//!
//! Non-products blocks have no filter semantics to replay; the inspector
//! reads out whatever the block stores so the generator can describe the
//! component's settings and ask a useful follow-up.

use crate::filter_chain::ChainOutcome;
use lantern_core::component::{ComponentConfig, SortOrder};
use lantern_core::trace::{StepKind, TraceStep};
use lantern_db::models::Block;
use serde_json::json;

/// Summarise one non-products block as a single `block_config` step.
pub fn inspect_block(block: &Block) -> ChainOutcome {
    let mut explicit = block.relation("products").to_vec();
    for item in block.relation("includeProducts") {
        if !explicit.iter().any(|existing| existing.id == item.id) {
            explicit.push(item.clone());
        }
    }

    let config = ComponentConfig {
        categories: block.relation("includeCategories").to_vec(),
        regions: block.relation("includeRegions").to_vec(),
        tiers: block.relation("includeTiers").to_vec(),
        taxonomy: block.relation("includeTaxonomy").to_vec(),
        explicit_products: explicit,
        exclude_products: block.relation("excludeProducts").to_vec(),
        limit: block.field_i64("limit").unwrap_or(0).max(0),
        order: SortOrder::from_field(block.field_str("order")),
        style: block.field_str("style").map(str::to_string),
        layout: block.field_str("layout").map(str::to_string),
    };

    let relations: serde_json::Map<String, serde_json::Value> = block
        .relations
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(handle, items)| {
            let titles: Vec<&str> = items.iter().map(|item| item.title.as_str()).collect();
            (handle.clone(), json!(titles))
        })
        .collect();

    let fields: serde_json::Map<String, serde_json::Value> = block
        .field_values
        .iter()
        .filter(|(_, value)| !is_trivial(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let step = TraceStep::info(
        StepKind::BlockConfig,
        format!(
            "'{}' component with {} configured relation fields",
            block.block_type,
            relations.len()
        ),
    )
    .detail("blockType", json!(block.block_type))
    .detail("relations", json!(relations))
    .detail("fields", json!(fields));

    ChainOutcome {
        config,
        trace: vec![step],
    }
}

/// A `block_config` step describing a page whose blocks did not match the
/// asked-about component. Not an error: the generator turns this into a
/// clarifying question.
pub fn describe_available_blocks(page_title: &str, blocks: &[Block]) -> TraceStep {
    let available: Vec<&str> = blocks.iter().map(|b| b.block_type.as_str()).collect();
    TraceStep::info(
        StepKind::BlockConfig,
        format!(
            "no matching component on '{page_title}'; the page has {} components",
            blocks.len()
        ),
    )
    .detail("availableComponents", json!(available))
}

/// A `block_config` step for a URI that resolved to no page at all.
pub fn describe_missing_page(uri: &str) -> TraceStep {
    TraceStep::info(
        StepKind::BlockConfig,
        format!("no page found for '{uri}'"),
    )
    .detail("requestedUri", json!(uri))
}

fn is_trivial(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
