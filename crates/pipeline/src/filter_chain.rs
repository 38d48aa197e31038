//! The products filter chain.
//!
//! A products block's configuration is turned into a final product list by
//! a fixed nine-step algorithm. Every step appends one trace entry with
//! the surviving set and a target-presence verdict, so the generator can
//! point at the exact step where an asked-about product dropped out.

use crate::error::PipelineResult;
use lantern_core::component::{ComponentConfig, RelatedItem, SortOrder};
use lantern_core::trace::{StepKind, TraceStep};
use lantern_core::Tenant;
use lantern_db::models::{Block, TenantSchema};
use lantern_db::ContentStore;
use serde_json::json;
use std::collections::HashSet;

/// Fallback display limit when a block stores none. Matches the CMS's
/// component default.
const DEFAULT_COMPONENT_LIMIT: i64 = 12;

/// A collected snapshot: resolved configuration plus the ordered trace.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub config: ComponentConfig,
    pub trace: Vec<TraceStep>,
}

/// Read a products block's stored settings into a [`ComponentConfig`].
/// Hand-picked products are the union of the legacy `products` field and
/// `includeProducts`, in that order.
pub fn component_config(block: &Block) -> ComponentConfig {
    let mut explicit = block.relation("products").to_vec();
    for item in block.relation("includeProducts") {
        if !explicit.iter().any(|existing| existing.id == item.id) {
            explicit.push(item.clone());
        }
    }

    ComponentConfig {
        categories: block.relation("includeCategories").to_vec(),
        regions: block.relation("includeRegions").to_vec(),
        tiers: block.relation("includeTiers").to_vec(),
        taxonomy: block.relation("includeTaxonomy").to_vec(),
        explicit_products: explicit,
        exclude_products: block.relation("excludeProducts").to_vec(),
        limit: block
            .field_i64("limit")
            .unwrap_or(DEFAULT_COMPONENT_LIMIT)
            .max(0),
        order: SortOrder::from_field(block.field_str("order")),
        style: block.field_str("style").map(str::to_string),
        layout: block.field_str("layout").map(str::to_string),
    }
}

/// Run the nine-step chain for one resolved block.
pub async fn run_filter_chain(
    store: &dyn ContentStore,
    tenant: &Tenant,
    schema: &TenantSchema,
    block: &Block,
    targets: &[i64],
) -> PipelineResult<ChainOutcome> {
    let config = component_config(block);
    let mut trace = Vec::with_capacity(9);

    // 1. resolve_categories
    let categories = resolve_hierarchy(store, tenant, &config.categories).await?;
    trace.push(
        TraceStep::info(
            StepKind::ResolveCategories,
            format!(
                "{} categories selected ({} after removing broader parents)",
                config.categories.len(),
                categories.len()
            ),
        )
        .detail("selected", json!(titles_for(&config.categories, &categories)))
        .detail("removedAncestors", json!(config.categories.len() - categories.len())),
    );

    // 2. resolve_regions
    let regions = resolve_hierarchy(store, tenant, &config.regions).await?;
    trace.push(
        TraceStep::info(
            StepKind::ResolveRegions,
            format!(
                "{} regions selected ({} after removing broader parents)",
                config.regions.len(),
                regions.len()
            ),
        )
        .detail("selected", json!(titles_for(&config.regions, &regions))),
    );

    // 3. region_to_products
    let mut region_products: Vec<i64> = Vec::new();
    if regions.is_empty() {
        trace.push(TraceStep::with_products(
            StepKind::RegionToProducts,
            "no region filter on this component".to_string(),
            Vec::new(),
            &[],
        ));
    } else {
        let postcodes = store.region_postcodes(tenant, &regions).await?;
        let (by_postcode, by_relation) = tokio::join!(
            store.products_by_postcodes(tenant, schema, &postcodes),
            store.products_by_region_relation(tenant, schema, &regions),
        );
        let by_postcode = by_postcode?;
        let by_relation = by_relation?;
        region_products = union(&by_postcode, &by_relation);
        trace.push(
            TraceStep::with_products(
                StepKind::RegionToProducts,
                format!(
                    "{} products located in the selected regions",
                    region_products.len()
                ),
                region_products.clone(),
                targets,
            )
            .detail("postcodes", json!(postcodes))
            .detail("byPostcode", json!(by_postcode.len()))
            .detail("byRelation", json!(by_relation.len())),
        );
    }

    // 4. resolve_taxonomy
    let taxonomy = resolve_hierarchy(store, tenant, &config.taxonomy).await?;
    trace.push(
        TraceStep::info(
            StepKind::ResolveTaxonomy,
            format!(
                "{} experience types selected ({} after removing broader parents)",
                config.taxonomy.len(),
                taxonomy.len()
            ),
        )
        .detail("selected", json!(titles_for(&config.taxonomy, &taxonomy))),
    );

    // 5. main_query
    let tiers = ids_of(&config.tiers);
    let mut dimensions: Vec<(&str, Vec<i64>)> = Vec::new();
    if !categories.is_empty() {
        dimensions.push(("categories", categories.clone()));
    }
    if !tiers.is_empty() {
        dimensions.push(("tiers", tiers));
    }
    if !taxonomy.is_empty() {
        dimensions.push(("taxonomy", taxonomy.clone()));
    }

    let mut relation_result: Option<Vec<i64>> = None;
    for (_, ids) in &dimensions {
        let matched = store.products_related_to_any(tenant, schema, ids).await?;
        relation_result = Some(match relation_result {
            None => matched,
            Some(current) => intersect(&current, &matched),
        });
    }

    let main_set = match (&relation_result, region_products.is_empty()) {
        (Some(relations), false) => intersect(&region_products, relations),
        (Some(relations), true) => relations.clone(),
        (None, false) => region_products.clone(),
        (None, true) => Vec::new(),
    };
    trace.push(
        TraceStep::with_products(
            StepKind::MainQuery,
            if dimensions.is_empty() && region_products.is_empty() {
                "no automatic filters on this component".to_string()
            } else {
                format!("{} products match every active filter", main_set.len())
            },
            main_set.clone(),
            targets,
        )
        .detail(
            "activeFilters",
            json!(dimensions.iter().map(|(name, _)| *name).collect::<Vec<_>>()),
        ),
    );

    // 6. merge_explicit
    let explicit = ids_of(&config.explicit_products);
    let filters_active = config.has_active_filters();
    let merged = if filters_active {
        union(&main_set, &explicit)
    } else {
        explicit.clone()
    };
    trace.push(
        TraceStep::with_products(
            StepKind::MergeExplicit,
            format!("{} hand-picked products merged in", explicit.len()),
            merged.clone(),
            targets,
        )
        .detail("handPicked", json!(explicit)),
    );

    // 7. apply_excludes
    let excluded = ids_of(&config.exclude_products);
    let after_excludes = subtract(&merged, &excluded);
    trace.push(
        TraceStep::with_products(
            StepKind::ApplyExcludes,
            format!("{} products explicitly excluded", excluded.len()),
            after_excludes.clone(),
            targets,
        )
        .detail("excluded", json!(excluded)),
    );

    // 8. sort
    let titles = store
        .product_titles(tenant, &after_excludes, config.order)
        .await?;
    let (sorted, sort_note) = apply_order(&after_excludes, &titles, config.order);
    trace.push(TraceStep::with_products(
        StepKind::Sort,
        sort_note,
        sorted.clone(),
        targets,
    ));

    // 9. limit
    let final_set: Vec<i64> = sorted.iter().copied().take(config.limit as usize).collect();
    let final_products: Vec<serde_json::Value> = final_set
        .iter()
        .map(|id| {
            let title = titles
                .iter()
                .find(|item| item.id == *id)
                .map(|item| item.title.as_str())
                .unwrap_or("");
            json!({ "id": id, "title": title })
        })
        .collect();
    trace.push(
        TraceStep::with_products(
            StepKind::Limit,
            format!("display limit of {} applied", config.limit),
            final_set,
            targets,
        )
        .detail("products", json!(final_products)),
    );

    Ok(ChainOutcome { config, trace })
}

/// Strip ancestors from a selected category set: only the deepest
/// selections filter, broader parents are implied.
async fn resolve_hierarchy(
    store: &dyn ContentStore,
    tenant: &Tenant,
    selected: &[RelatedItem],
) -> PipelineResult<Vec<i64>> {
    let ids = ids_of(selected);
    if ids.is_empty() {
        return Ok(ids);
    }
    Ok(store.deepest_only(tenant, &ids).await?)
}

fn apply_order(ids: &[i64], titles: &[RelatedItem], order: SortOrder) -> (Vec<i64>, String) {
    match order {
        SortOrder::Alphabetically => {
            let mut items: Vec<(&RelatedItem, i64)> = ids
                .iter()
                .filter_map(|id| titles.iter().find(|t| t.id == *id).map(|t| (t, *id)))
                .collect();
            // Equal titles tie-break on id to keep the order stable.
            items.sort_by(|(a, a_id), (b, b_id)| {
                a.title
                    .to_lowercase()
                    .cmp(&b.title.to_lowercase())
                    .then(a_id.cmp(b_id))
            });
            let mut sorted: Vec<i64> = items.into_iter().map(|(_, id)| id).collect();
            // Products with no content row sort last, in input order.
            for id in ids {
                if !sorted.contains(id) {
                    sorted.push(*id);
                }
            }
            (sorted, "ordered alphabetically by title".to_string())
        }
        SortOrder::EventDate => {
            // The title query already ordered by next event date.
            let mut sorted: Vec<i64> = titles
                .iter()
                .map(|t| t.id)
                .filter(|id| ids.contains(id))
                .collect();
            for id in ids {
                if !sorted.contains(id) {
                    sorted.push(*id);
                }
            }
            (sorted, "ordered by next event date".to_string())
        }
        SortOrder::Random => (
            ids.to_vec(),
            "random order; the selection shuffles on each page load".to_string(),
        ),
    }
}

fn ids_of(items: &[RelatedItem]) -> Vec<i64> {
    items.iter().map(|item| item.id).collect()
}

fn titles_for(items: &[RelatedItem], surviving: &[i64]) -> Vec<String> {
    items
        .iter()
        .filter(|item| surviving.contains(&item.id))
        .map(|item| item.title.clone())
        .collect()
}

fn union(a: &[i64], b: &[i64]) -> Vec<i64> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let mut seen = HashSet::new();
    for id in a.iter().chain(b) {
        if seen.insert(*id) {
            out.push(*id);
        }
    }
    out
}

fn intersect(a: &[i64], b: &[i64]) -> Vec<i64> {
    let b_set: HashSet<i64> = b.iter().copied().collect();
    let mut seen = HashSet::new();
    a.iter()
        .copied()
        .filter(|id| b_set.contains(id) && seen.insert(*id))
        .collect()
}

fn subtract(a: &[i64], b: &[i64]) -> Vec<i64> {
    let b_set: HashSet<i64> = b.iter().copied().collect();
    a.iter().copied().filter(|id| !b_set.contains(id)).collect()
}
