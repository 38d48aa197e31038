//! Import-domain collector.
//!
//! Answers "why was this ATDW product (not) imported?" by snapshotting
//! the record's stored state against the tenant's import configuration:
//! configured regions and postcodes, category mappings, and the linked
//! CMS entry if one exists. Each step reports facts; interpretation is
//! the generator's job.

use crate::error::PipelineResult;
use lantern_core::component::{AtdwImportConfig, RegionPostcodes};
use lantern_core::trace::{StepKind, TraceStep};
use lantern_core::{ParsedIntent, Tenant};
use lantern_db::models::AtdwProductRow;
use lantern_db::schema::ATDW_MAPPING_GROUP_HANDLE;
use lantern_db::ContentStore;
use serde_json::json;
use time::macros::format_description;

/// Postcodes within this numeric distance of a missed postcode are
/// suggested as near misses.
const NEARBY_DISTANCE: i64 = 50;

/// At most this many near-miss postcodes are reported.
const NEARBY_CAP: usize = 10;

/// A collected import snapshot: record configuration plus the trace.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub config: AtdwImportConfig,
    pub trace: Vec<TraceStep>,
}

/// Run the import-domain collector for an intent carrying a product id
/// and/or product names.
pub async fn collect_import(
    store: &dyn ContentStore,
    tenant: &Tenant,
    intent: &ParsedIntent,
) -> PipelineResult<ImportOutcome> {
    let mut trace = Vec::with_capacity(6);

    // 1. atdw_lookup
    let record = lookup_record(store, tenant, intent).await?;
    let Some(record) = record else {
        let stats = store.atdw_import_stats(tenant).await?;
        let asked = intent
            .atdw_product_id
            .clone()
            .or_else(|| intent.product_names.first().cloned())
            .unwrap_or_default();
        trace.push(
            TraceStep::info(
                StepKind::AtdwLookup,
                format!("no ATDW record found for '{asked}'"),
            )
            .with_target_present(Some(false))
            .detail("totalRecords", json!(stats.total))
            .detail("importedRecords", json!(stats.imported))
            .detail("lastImportUpdate", json!(stats.last_updated)),
        );
        let config = AtdwImportConfig {
            product_name: asked,
            ..Default::default()
        };
        return Ok(ImportOutcome { config, trace });
    };

    let payload: serde_json::Value = record
        .payload
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(serde_json::Value::Null);
    let last_updated = record.date_updated.map(|dt| {
        dt.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
            .unwrap_or_default()
    });

    let mut config = AtdwImportConfig {
        product_id: record.product_id.clone(),
        product_name: record.product_name.clone(),
        category: record.category.clone(),
        atdw_status: record.status.clone(),
        imported: record.imported,
        has_entry: record.entry_id.is_some(),
        entry_id: record.entry_id,
        postcode: first_address_str(&payload, "postcode"),
        city: first_address_str(&payload, "city"),
        organisation: organisation_name(&payload),
        reason: record.reason.clone(),
        last_updated,
        ..Default::default()
    };

    trace.push(
        TraceStep::info(
            StepKind::AtdwLookup,
            format!(
                "found ATDW record '{}' ({})",
                record.product_name, record.product_id
            ),
        )
        .with_target_present(Some(true))
        .detail("productId", json!(record.product_id))
        .detail("category", json!(record.category)),
    );

    // 2. atdw_region_config
    let regions = store.region_categories(tenant).await?;
    config.configured_regions = regions
        .iter()
        .map(|region| RegionPostcodes {
            region: region.title.clone(),
            postcodes: region.postcodes.clone(),
        })
        .collect();
    let region_filtering_active = regions.iter().any(|r| !r.postcodes.is_empty());
    trace.push(
        TraceStep::info(
            StepKind::AtdwRegionConfig,
            format!(
                "{} import regions configured, {} with postcodes",
                regions.len(),
                regions.iter().filter(|r| !r.postcodes.is_empty()).count()
            ),
        )
        .detail(
            "regions",
            json!(regions
                .iter()
                .map(|r| json!({ "region": r.title, "postcodes": r.postcodes }))
                .collect::<Vec<_>>()),
        ),
    );

    // 3. atdw_postcode_match
    config.matching_regions = regions
        .iter()
        .filter(|region| {
            config
                .postcode
                .as_deref()
                .is_some_and(|pc| region.postcodes.iter().any(|p| p == pc))
        })
        .map(|region| region.title.clone())
        .collect();
    let matched = !config.matching_regions.is_empty();
    let mut step = TraceStep::info(
        StepKind::AtdwPostcodeMatch,
        match (&config.postcode, region_filtering_active, matched) {
            (None, true, _) => "the record has no postcode, so no region can claim it".to_string(),
            (None, false, _) => "the record has no postcode; region filtering is off".to_string(),
            (Some(pc), false, _) => {
                format!("postcode {pc} noted; region filtering is off")
            }
            (Some(pc), true, true) => format!(
                "postcode {pc} belongs to: {}",
                config.matching_regions.join(", ")
            ),
            (Some(pc), true, false) => {
                format!("postcode {pc} is outside every configured region")
            }
        },
    )
    .with_target_present(Some(matched || !region_filtering_active))
    .detail("postcode", json!(config.postcode))
    .detail("matchingRegions", json!(config.matching_regions));
    if region_filtering_active && !matched {
        if let Some(pc) = config.postcode.as_deref() {
            step = step.detail("nearbyPostcodes", json!(nearby_postcodes(pc, &regions)));
        }
    }
    trace.push(step);

    // 4. atdw_status_eval
    trace.push(
        TraceStep::info(
            StepKind::AtdwStatusEval,
            format!(
                "status '{}', {}",
                config.atdw_status.as_deref().unwrap_or("unknown"),
                if config.imported {
                    "imported"
                } else {
                    "not imported"
                }
            ),
        )
        .detail("status", json!(config.atdw_status))
        .detail("imported", json!(config.imported))
        .detail("entryId", json!(config.entry_id))
        .detail("lastUpdated", json!(config.last_updated))
        .detail("reason", json!(config.reason)),
    );

    // 5. atdw_category_mapping
    collect_category_mapping(store, tenant, &record, &payload, &mut config, &mut trace).await?;

    // 6. atdw_entry_state / atdw_entry_link
    match record.entry_id {
        Some(entry_id) => {
            let state = store.entry_state(tenant, entry_id).await?;
            match state {
                Some(state) => {
                    trace.push(
                        TraceStep::info(
                            StepKind::AtdwEntryState,
                            format!(
                                "website listing '{}' is {}",
                                state.title,
                                if state.enabled { "live" } else { "disabled" }
                            ),
                        )
                        .detail("enabled", json!(state.enabled))
                        .detail("custom", json!(state.is_custom))
                        .detail("categoryCount", json!(state.category_count))
                        .detail("imageCount", json!(state.image_count))
                        .detail("typeId", json!(state.type_id))
                        .detail(
                            "expiryDate",
                            json!(state.expiry_date.map(|d| d.to_string())),
                        ),
                    );
                }
                None => {
                    trace.push(
                        TraceStep::info(
                            StepKind::AtdwEntryState,
                            format!("linked listing {entry_id} no longer exists"),
                        )
                        .detail("entryId", json!(entry_id)),
                    );
                }
            }
        }
        None => {
            trace.push(
                TraceStep::info(
                    StepKind::AtdwEntryLink,
                    "no website listing is linked to this record",
                )
                .detail("hasEntry", json!(false)),
            );
        }
    }

    Ok(ImportOutcome { config, trace })
}

async fn lookup_record(
    store: &dyn ContentStore,
    tenant: &Tenant,
    intent: &ParsedIntent,
) -> PipelineResult<Option<AtdwProductRow>> {
    if let Some(id) = &intent.atdw_product_id {
        if let Some(record) = store.find_atdw_product_by_id(tenant, id).await? {
            return Ok(Some(record));
        }
    }
    for name in &intent.product_names {
        if let Some(record) = store.find_atdw_product_by_name(tenant, name).await? {
            return Ok(Some(record));
        }
    }
    Ok(None)
}

async fn collect_category_mapping(
    store: &dyn ContentStore,
    tenant: &Tenant,
    record: &AtdwProductRow,
    payload: &serde_json::Value,
    config: &mut AtdwImportConfig,
    trace: &mut Vec<TraceStep>,
) -> PipelineResult<()> {
    let mut mapped = Vec::new();
    let mut unmapped = Vec::new();

    if let Some(category) = record.category.as_deref() {
        match store
            .category_by_slug(tenant, ATDW_MAPPING_GROUP_HANDLE, &category.to_lowercase())
            .await?
        {
            Some(mapping) => {
                for item in store.related_categories(tenant, mapping.id).await? {
                    if !mapped.contains(&item.title) {
                        mapped.push(item.title);
                    }
                }
            }
            None => unmapped.push(category.to_string()),
        }
    }

    for classification in vertical_classifications(payload) {
        match store
            .category_by_slug(
                tenant,
                ATDW_MAPPING_GROUP_HANDLE,
                &classification.to_lowercase(),
            )
            .await?
        {
            Some(mapping) => {
                for item in store.related_categories(tenant, mapping.id).await? {
                    if !mapped.contains(&item.title) {
                        mapped.push(item.title);
                    }
                }
            }
            None => {
                if !unmapped.contains(&classification) {
                    unmapped.push(classification);
                }
            }
        }
    }

    if let Some(entry_id) = record.entry_id {
        config.entry_categories = store
            .related_categories(tenant, entry_id)
            .await?
            .into_iter()
            .map(|item| item.title)
            .collect();
    }

    config.mapped_categories = mapped;
    config.unmapped_classifications = unmapped;

    trace.push(
        TraceStep::info(
            StepKind::AtdwCategoryMapping,
            format!(
                "{} site categories mapped, {} classifications unmapped",
                config.mapped_categories.len(),
                config.unmapped_classifications.len()
            ),
        )
        .detail("mapped", json!(config.mapped_categories))
        .detail("unmapped", json!(config.unmapped_classifications))
        .detail("entryCategories", json!(config.entry_categories)),
    );
    Ok(())
}

fn first_address_str(payload: &serde_json::Value, key: &str) -> Option<String> {
    let address = payload.get("addresses")?.as_array()?.first()?;
    match address.get(key)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn organisation_name(payload: &serde_json::Value) -> Option<String> {
    payload
        .get("organisation")
        .and_then(|org| org.get("name"))
        .or_else(|| payload.get("organisationName"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn vertical_classifications(payload: &serde_json::Value) -> Vec<String> {
    let Some(entries) = payload
        .get("verticalClassifications")
        .and_then(|v| v.as_array())
    else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            serde_json::Value::String(s) => Some(s.clone()),
            other => other
                .get("productTypeId")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Configured postcodes numerically within [`NEARBY_DISTANCE`] of the
/// missed postcode, closest first, capped at [`NEARBY_CAP`].
fn nearby_postcodes(postcode: &str, regions: &[lantern_db::models::RegionCategory]) -> Vec<String> {
    let Ok(target) = postcode.trim().parse::<i64>() else {
        return Vec::new();
    };
    let mut candidates: Vec<(i64, String)> = Vec::new();
    for region in regions {
        for pc in &region.postcodes {
            let Ok(value) = pc.trim().parse::<i64>() else {
                continue;
            };
            let distance = (value - target).abs();
            if distance > 0
                && distance <= NEARBY_DISTANCE
                && !candidates.iter().any(|(_, existing)| existing == pc)
            {
                candidates.push((distance, pc.clone()));
            }
        }
    }
    candidates.sort();
    candidates
        .into_iter()
        .take(NEARBY_CAP)
        .map(|(_, pc)| pc)
        .collect()
}
