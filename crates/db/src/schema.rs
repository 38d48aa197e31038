//! Per-tenant schema resolution.
//!
//! Tenants share one CMS codebase but carry their own field and section
//! ids, so every request first resolves the tenant's schema snapshot. The
//! snapshot is cached in the KV store for an hour and rebuilt
//! write-through on miss or staleness.

use crate::error::DbResult;
use crate::models::TenantSchema;
use crate::store::ContentStore;
use lantern_cache::{keys, KvStore};
use lantern_core::{Tenant, SCHEMA_TTL};
use time::OffsetDateTime;

/// Matrix field holding the page builder. Block types of this field are
/// the page components.
pub const PAGE_BUILDER_HANDLE: &str = "pageBuilder";

/// Global-context fields the pipeline needs ids for.
pub const GLOBAL_FIELD_HANDLES: &[&str] = &[
    PAGE_BUILDER_HANDLE,
    "roam_products_locations",
    "roam_products_description",
    "roam_products_nextEventDate",
    "roam_products_tiers",
    "roam_categories_regionPostcodes",
    "roam_categories_regionLocalities",
];

/// Sections the pipeline resolves pages and products against.
pub const SECTION_HANDLES: &[&str] = &["products", "pages", "homepage"];

/// Category group holding the product regions.
pub const REGION_GROUP_HANDLE: &str = "regions";

/// Category group mapping provider classifications to site categories.
pub const ATDW_MAPPING_GROUP_HANDLE: &str = "atdwCategoryMap";

/// Fetch the tenant's schema, rebuilding and write-through caching when
/// the KV copy is missing, stale, or unparseable.
pub async fn resolve_schema(
    kv: &dyn KvStore,
    store: &dyn ContentStore,
    tenant: &Tenant,
) -> DbResult<TenantSchema> {
    let key = keys::schema(tenant.as_str());

    if let Some(cached) = kv.get(&key).await? {
        match serde_json::from_str::<TenantSchema>(&cached) {
            Ok(schema) if schema.is_fresh(OffsetDateTime::now_utc()) => {
                tracing::debug!(tenant = %tenant, "schema cache hit");
                return Ok(schema);
            }
            Ok(_) => tracing::debug!(tenant = %tenant, "schema cache stale, rebuilding"),
            Err(e) => {
                tracing::warn!(tenant = %tenant, error = %e, "discarding unparseable schema cache entry");
            }
        }
    }

    let schema = store.rebuild_schema(tenant).await?;
    let serialized = serde_json::to_string(&schema)?;
    kv.put(&key, serialized, Some(SCHEMA_TTL)).await?;
    tracing::info!(
        tenant = %tenant,
        fields = schema.fields.len(),
        sections = schema.sections.len(),
        table = %schema.matrix_content_table,
        "rebuilt tenant schema"
    );
    Ok(schema)
}

/// Drop the cached schema so the next request rebuilds it.
pub async fn invalidate_schema(kv: &dyn KvStore, tenant: &Tenant) -> DbResult<()> {
    kv.delete(&keys::schema(tenant.as_str())).await?;
    Ok(())
}
