//! Content store trait.

use crate::error::DbResult;
use crate::models::{
    AtdwProductRow, Block, EntryState, ImportStats, PageRow, RegionCategory, TenantSchema,
};
use async_trait::async_trait;
use lantern_core::component::{RelatedItem, SortOrder};
use lantern_core::Tenant;

/// Read access to one tenant's CMS content.
///
/// All methods are single-purpose, parameterised queries; callers compose
/// them. Methods taking id sets return empty results for empty inputs
/// without touching the database.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Rebuild the per-tenant schema snapshot from the live database.
    /// Fails with `SchemaIncomplete` when the page-builder field is absent.
    async fn rebuild_schema(&self, tenant: &Tenant) -> DbResult<TenantSchema>;

    /// Resolve a request URI to the first enabled, live page. Candidates
    /// are tried most specific first; `""` and `"/"` map to the homepage.
    async fn find_page(&self, tenant: &Tenant, uri: &str) -> DbResult<Option<PageRow>>;

    /// Page-builder blocks of a page in sort order, optionally restricted
    /// to one block type. Relations and field values are populated.
    async fn page_blocks(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        page_id: i64,
        block_type: Option<&str>,
    ) -> DbResult<Vec<Block>>;

    /// The subset of `ids` with no descendant also in `ids`, per the
    /// nested-set structure table. Input order is preserved.
    async fn deepest_only(&self, tenant: &Tenant, ids: &[i64]) -> DbResult<Vec<i64>>;

    /// Distinct, trimmed postcodes configured on the given region
    /// categories.
    async fn region_postcodes(&self, tenant: &Tenant, region_ids: &[i64]) -> DbResult<Vec<String>>;

    /// Enabled products whose locations field matches any of the
    /// postcodes, via the content search index.
    async fn products_by_postcodes(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        postcodes: &[String],
    ) -> DbResult<Vec<i64>>;

    /// Enabled products directly related to any of the region categories.
    async fn products_by_region_relation(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        region_ids: &[i64],
    ) -> DbResult<Vec<i64>>;

    /// Enabled products related to at least one of the target ids. One
    /// call covers one filter dimension; the caller intersects dimensions.
    async fn products_related_to_any(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        target_ids: &[i64],
    ) -> DbResult<Vec<i64>>;

    /// Enabled products in the products section whose title matches any of
    /// the given names. Used to resolve asked-about product names into
    /// target ids.
    async fn products_by_title(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        names: &[String],
    ) -> DbResult<Vec<RelatedItem>>;

    /// Titles for the given products, ordered per `order`. Alphabetical
    /// ordering is applied by the caller for locale-stable tie-breaks;
    /// event-date ordering is applied here, nulls last.
    async fn product_titles(
        &self,
        tenant: &Tenant,
        ids: &[i64],
        order: SortOrder,
    ) -> DbResult<Vec<RelatedItem>>;

    /// Import-ledger record by provider id.
    async fn find_atdw_product_by_id(
        &self,
        tenant: &Tenant,
        product_id: &str,
    ) -> DbResult<Option<AtdwProductRow>>;

    /// Import-ledger record by name: a tight title match inside the stored
    /// payload first, then a broad name match. Most recently updated wins.
    async fn find_atdw_product_by_name(
        &self,
        tenant: &Tenant,
        name: &str,
    ) -> DbResult<Option<AtdwProductRow>>;

    /// Table-level statistics for the import ledger.
    async fn atdw_import_stats(&self, tenant: &Tenant) -> DbResult<ImportStats>;

    /// Enabled region categories with their configured postcode sets.
    async fn region_categories(&self, tenant: &Tenant) -> DbResult<Vec<RegionCategory>>;

    /// A category inside a group, matched by slug.
    async fn category_by_slug(
        &self,
        tenant: &Tenant,
        group_handle: &str,
        slug: &str,
    ) -> DbResult<Option<RelatedItem>>;

    /// Categories related to a source element, in relation sort order.
    async fn related_categories(
        &self,
        tenant: &Tenant,
        source_id: i64,
    ) -> DbResult<Vec<RelatedItem>>;

    /// Current CMS state of a product entry, with category/image counts.
    async fn entry_state(&self, tenant: &Tenant, entry_id: i64) -> DbResult<Option<EntryState>>;
}
