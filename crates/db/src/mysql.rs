//! MySQL content store implementation.
//!
//! One MySQL server hosts every tenant, one schema each. Queries qualify
//! every table with the validated tenant prefix; the matrix-content table
//! name is additionally gated by its own pattern before composition. All
//! other values are bound.

use crate::error::{DbError, DbResult};
use crate::models::{
    AtdwProductRow, Block, EntryState, ImportStats, PageRow, RegionCategory, TenantSchema,
};
use crate::schema::{GLOBAL_FIELD_HANDLES, PAGE_BUILDER_HANDLE, REGION_GROUP_HANDLE, SECTION_HANDLES};
use crate::sql::{
    checked_matrix_table, field_key, keyword_pattern, page_uri_candidates, placeholders,
    row_to_map, sanitize_like,
};
use crate::store::ContentStore;
use async_trait::async_trait;
use lantern_core::component::{RelatedItem, SortOrder};
use lantern_core::Tenant;
use sqlx::{FromRow, MySqlPool};
use std::collections::{BTreeMap, HashSet};
use time::OffsetDateTime;

/// MySQL-backed [`ContentStore`].
pub struct MySqlContentStore {
    pool: MySqlPool,
}

impl MySqlContentStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Connectivity probe for the health endpoint.
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn block_relations(
        &self,
        tenant: &Tenant,
        block_id: i64,
    ) -> DbResult<BTreeMap<String, Vec<RelatedItem>>> {
        let sql = format!(
            "SELECT f.handle AS field_handle, r.targetId AS target_id, \
                    COALESCE(c.title, '') AS title \
             FROM {relations} r \
             INNER JOIN {fields} f ON f.id = r.fieldId \
             LEFT JOIN {content} c ON c.elementId = r.targetId \
             WHERE r.sourceId = ? \
             ORDER BY f.handle ASC, r.sortOrder ASC",
            relations = tenant.qualify("craft_relations"),
            fields = tenant.qualify("craft_fields"),
            content = tenant.qualify("craft_content"),
        );
        let rows = sqlx::query_as::<_, RelationRow>(&sql)
            .bind(block_id)
            .fetch_all(&self.pool)
            .await?;

        let mut relations: BTreeMap<String, Vec<RelatedItem>> = BTreeMap::new();
        let mut seen: HashSet<(String, i64)> = HashSet::new();
        for row in rows {
            if seen.insert((row.field_handle.clone(), row.target_id)) {
                relations
                    .entry(row.field_handle)
                    .or_default()
                    .push(RelatedItem::new(row.target_id, row.title));
            }
        }
        Ok(relations)
    }

    async fn block_field_values(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        block_id: i64,
        block_type: &str,
    ) -> DbResult<BTreeMap<String, serde_json::Value>> {
        let table = checked_matrix_table(&schema.matrix_content_table)?;
        let sql = format!(
            "SELECT * FROM {table} WHERE elementId = ? LIMIT 1",
            table = tenant.qualify(table),
        );
        let row = sqlx::query(&sql)
            .bind(block_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(BTreeMap::new());
        };
        let values = row_to_map(&row)
            .into_iter()
            .filter_map(|(column, value)| field_key(&column, block_type).map(|key| (key, value)))
            .collect();
        Ok(values)
    }

    async fn products_related(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        target_ids: &[i64],
    ) -> DbResult<Vec<i64>> {
        if target_ids.is_empty() {
            return Ok(Vec::new());
        }
        let Some(section_id) = schema.section("products") else {
            tracing::warn!(tenant = %tenant, "products section missing from schema");
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT DISTINCT r.sourceId AS id \
             FROM {relations} r \
             INNER JOIN {entries} en ON en.id = r.sourceId \
             INNER JOIN {elements} e ON e.id = r.sourceId \
             WHERE r.targetId IN ({ph}) \
               AND en.sectionId = ? \
               AND e.enabled = 1 \
               AND e.dateDeleted IS NULL",
            relations = tenant.qualify("craft_relations"),
            entries = tenant.qualify("craft_entries"),
            elements = tenant.qualify("craft_elements"),
            ph = placeholders(target_ids.len()),
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for id in target_ids {
            query = query.bind(id);
        }
        Ok(query.bind(section_id).fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl ContentStore for MySqlContentStore {
    async fn rebuild_schema(&self, tenant: &Tenant) -> DbResult<TenantSchema> {
        let mut fields = BTreeMap::new();

        // Block-type context first: fields live under the uid of the
        // page-builder block type.
        let uid_sql = format!(
            "SELECT uid FROM {table} WHERE handle = ? LIMIT 1",
            table = tenant.qualify("craft_matrixblocktypes"),
        );
        let block_type_uid = sqlx::query_scalar::<_, String>(&uid_sql)
            .bind(PAGE_BUILDER_HANDLE)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(uid) = block_type_uid {
            let context_sql = format!(
                "SELECT id, handle FROM {table} WHERE context = ?",
                table = tenant.qualify("craft_fields"),
            );
            let rows = sqlx::query_as::<_, HandleRow>(&context_sql)
                .bind(format!("matrixBlockType:{uid}"))
                .fetch_all(&self.pool)
                .await?;
            for row in rows {
                fields.insert(row.handle, row.id);
            }
        }

        let global_sql = format!(
            "SELECT id, handle FROM {table} WHERE context = 'global' AND handle IN ({ph})",
            table = tenant.qualify("craft_fields"),
            ph = placeholders(GLOBAL_FIELD_HANDLES.len()),
        );
        let mut global_query = sqlx::query_as::<_, HandleRow>(&global_sql);
        for handle in GLOBAL_FIELD_HANDLES {
            global_query = global_query.bind(handle);
        }
        let mut page_builder_handle = None;
        for row in global_query.fetch_all(&self.pool).await? {
            if row.handle == PAGE_BUILDER_HANDLE {
                page_builder_handle = Some(row.handle.clone());
            }
            fields.insert(format!("global:{}", row.handle), row.id);
        }

        let Some(page_builder_handle) = page_builder_handle else {
            return Err(DbError::SchemaIncomplete {
                tenant: tenant.to_string(),
                missing: format!("global field '{PAGE_BUILDER_HANDLE}'"),
            });
        };

        let sections_sql = format!(
            "SELECT id, handle FROM {table} WHERE handle IN ({ph})",
            table = tenant.qualify("craft_sections"),
            ph = placeholders(SECTION_HANDLES.len()),
        );
        let mut sections_query = sqlx::query_as::<_, HandleRow>(&sections_sql);
        for handle in SECTION_HANDLES {
            sections_query = sections_query.bind(handle);
        }
        let sections = sections_query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| (row.handle, row.id))
            .collect();

        let table = format!(
            "craft_matrixcontent_{}",
            page_builder_handle.to_lowercase()
        );
        checked_matrix_table(&table)?;

        Ok(TenantSchema {
            fields,
            sections,
            matrix_content_table: table,
            cached_at: OffsetDateTime::now_utc(),
        })
    }

    async fn find_page(&self, tenant: &Tenant, uri: &str) -> DbResult<Option<PageRow>> {
        let sql = format!(
            "SELECT e.id AS id, COALESCE(c.title, '') AS title, es.uri AS uri \
             FROM {elements} e \
             INNER JOIN {sites} es ON es.elementId = e.id \
             INNER JOIN {entries} en ON en.id = e.id \
             LEFT JOIN {content} c ON c.elementId = e.id \
             WHERE es.uri = ? \
               AND e.enabled = 1 \
               AND es.enabled = 1 \
               AND e.archived = 0 \
               AND e.dateDeleted IS NULL \
               AND e.revisionId IS NULL \
               AND e.draftId IS NULL \
             ORDER BY e.id ASC \
             LIMIT 1",
            elements = tenant.qualify("craft_elements"),
            sites = tenant.qualify("craft_elements_sites"),
            entries = tenant.qualify("craft_entries"),
            content = tenant.qualify("craft_content"),
        );

        for candidate in page_uri_candidates(uri) {
            let page = sqlx::query_as::<_, PageRow>(&sql)
                .bind(&candidate)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(page) = page {
                tracing::debug!(tenant = %tenant, uri = %candidate, page_id = page.id, "resolved page");
                return Ok(Some(page));
            }
        }
        Ok(None)
    }

    async fn page_blocks(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        page_id: i64,
        block_type: Option<&str>,
    ) -> DbResult<Vec<Block>> {
        let mut sql = format!(
            "SELECT mb.id AS id, mbt.handle AS block_type, mb.sortOrder AS sort_order \
             FROM {blocks} mb \
             INNER JOIN {types} mbt ON mbt.id = mb.typeId \
             INNER JOIN {elements} e ON e.id = mb.id \
             WHERE mb.ownerId = ? \
               AND e.enabled = 1 \
               AND e.dateDeleted IS NULL",
            blocks = tenant.qualify("craft_matrixblocks"),
            types = tenant.qualify("craft_matrixblocktypes"),
            elements = tenant.qualify("craft_elements"),
        );
        if block_type.is_some() {
            sql.push_str(" AND mbt.handle = ?");
        }
        sql.push_str(" ORDER BY mb.sortOrder ASC");

        let mut query = sqlx::query_as::<_, BlockHeadRow>(&sql).bind(page_id);
        if let Some(handle) = block_type {
            query = query.bind(handle);
        }
        let heads = query.fetch_all(&self.pool).await?;

        let mut blocks = Vec::with_capacity(heads.len());
        for head in heads {
            let (relations, field_values) = tokio::join!(
                self.block_relations(tenant, head.id),
                self.block_field_values(tenant, schema, head.id, &head.block_type),
            );
            blocks.push(Block {
                block_id: head.id,
                block_type: head.block_type,
                sort_order: head.sort_order,
                field_values: field_values?,
                relations: relations?,
            });
        }
        Ok(blocks)
    }

    async fn deepest_only(&self, tenant: &Tenant, ids: &[i64]) -> DbResult<Vec<i64>> {
        if ids.len() < 2 {
            return Ok(ids.to_vec());
        }
        let sql = format!(
            "SELECT DISTINCT parent.elementId AS id \
             FROM {structure} parent \
             INNER JOIN {structure} child \
                ON parent.structureId = child.structureId \
               AND parent.lft < child.lft \
               AND parent.rgt > child.rgt \
             WHERE parent.elementId IN ({ph}) \
               AND child.elementId IN ({ph}) \
               AND parent.elementId <> child.elementId",
            structure = tenant.qualify("craft_structureelements"),
            ph = placeholders(ids.len()),
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        for id in ids {
            query = query.bind(id);
        }
        let ancestors: HashSet<i64> = query.fetch_all(&self.pool).await?.into_iter().collect();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| !ancestors.contains(id))
            .collect())
    }

    async fn region_postcodes(&self, tenant: &Tenant, region_ids: &[i64]) -> DbResult<Vec<String>> {
        if region_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT c.field_roam_categories_regionPostcodes \
             FROM {content} c \
             WHERE c.elementId IN ({ph})",
            content = tenant.qualify("craft_content"),
            ph = placeholders(region_ids.len()),
        );
        let mut query = sqlx::query_scalar::<_, Option<String>>(&sql);
        for id in region_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut postcodes = Vec::new();
        for raw in rows.into_iter().flatten() {
            for postcode in parse_postcode_table(&raw) {
                if !postcodes.contains(&postcode) {
                    postcodes.push(postcode);
                }
            }
        }
        Ok(postcodes)
    }

    async fn products_by_postcodes(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        postcodes: &[String],
    ) -> DbResult<Vec<i64>> {
        if postcodes.is_empty() {
            return Ok(Vec::new());
        }
        let Some(locations_field) = schema.global_field("roam_products_locations") else {
            tracing::warn!(tenant = %tenant, "locations field missing from schema");
            return Ok(Vec::new());
        };
        let Some(section_id) = schema.section("products") else {
            tracing::warn!(tenant = %tenant, "products section missing from schema");
            return Ok(Vec::new());
        };

        let likes = vec!["si.keywords LIKE ?"; postcodes.len()].join(" OR ");
        let sql = format!(
            "SELECT DISTINCT si.elementId AS id \
             FROM {searchindex} si \
             INNER JOIN {elements} e ON e.id = si.elementId \
             INNER JOIN {entries} en ON en.id = si.elementId \
             WHERE si.fieldId = ? \
               AND en.sectionId = ? \
               AND e.enabled = 1 \
               AND e.dateDeleted IS NULL \
               AND ({likes})",
            searchindex = tenant.qualify("craft_searchindex"),
            elements = tenant.qualify("craft_elements"),
            entries = tenant.qualify("craft_entries"),
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql)
            .bind(locations_field)
            .bind(section_id);
        for postcode in postcodes {
            query = query.bind(keyword_pattern(postcode));
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn products_by_region_relation(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        region_ids: &[i64],
    ) -> DbResult<Vec<i64>> {
        self.products_related(tenant, schema, region_ids).await
    }

    async fn products_related_to_any(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        target_ids: &[i64],
    ) -> DbResult<Vec<i64>> {
        self.products_related(tenant, schema, target_ids).await
    }

    async fn products_by_title(
        &self,
        tenant: &Tenant,
        schema: &TenantSchema,
        names: &[String],
    ) -> DbResult<Vec<RelatedItem>> {
        let patterns: Vec<String> = names
            .iter()
            .map(|name| sanitize_like(name.trim()))
            .filter(|name| !name.is_empty())
            .map(|name| format!("%{name}%"))
            .collect();
        if patterns.is_empty() {
            return Ok(Vec::new());
        }
        let Some(section_id) = schema.section("products") else {
            tracing::warn!(tenant = %tenant, "products section missing from schema");
            return Ok(Vec::new());
        };

        let likes = vec!["c.title LIKE ?"; patterns.len()].join(" OR ");
        let sql = format!(
            "SELECT c.elementId AS id, COALESCE(c.title, '') AS title \
             FROM {content} c \
             INNER JOIN {entries} en ON en.id = c.elementId \
             INNER JOIN {elements} e ON e.id = c.elementId \
             WHERE en.sectionId = ? \
               AND e.enabled = 1 \
               AND e.dateDeleted IS NULL \
               AND ({likes}) \
             LIMIT 20",
            content = tenant.qualify("craft_content"),
            entries = tenant.qualify("craft_entries"),
            elements = tenant.qualify("craft_elements"),
        );
        let mut query = sqlx::query_as::<_, ItemRow>(&sql).bind(section_id);
        for pattern in &patterns {
            query = query.bind(pattern);
        }
        Ok(query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| RelatedItem::new(row.id, row.title))
            .collect())
    }

    async fn product_titles(
        &self,
        tenant: &Tenant,
        ids: &[i64],
        order: SortOrder,
    ) -> DbResult<Vec<RelatedItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let order_by = match order {
            // Event-ordered components rely on the stored next-event date;
            // entries with no upcoming event sort last.
            SortOrder::EventDate => {
                " ORDER BY c.field_roam_products_nextEventDate IS NULL, \
                   c.field_roam_products_nextEventDate ASC"
            }
            SortOrder::Alphabetically | SortOrder::Random => "",
        };
        let sql = format!(
            "SELECT c.elementId AS id, COALESCE(c.title, '') AS title \
             FROM {content} c \
             WHERE c.elementId IN ({ph}){order_by}",
            content = tenant.qualify("craft_content"),
            ph = placeholders(ids.len()),
        );
        let mut query = sqlx::query_as::<_, ItemRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        Ok(query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| RelatedItem::new(row.id, row.title))
            .collect())
    }

    async fn find_atdw_product_by_id(
        &self,
        tenant: &Tenant,
        product_id: &str,
    ) -> DbResult<Option<AtdwProductRow>> {
        let sql = format!(
            "{select} WHERE productId = ? LIMIT 1",
            select = atdw_select(tenant),
        );
        Ok(sqlx::query_as::<_, AtdwProductRow>(&sql)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_atdw_product_by_name(
        &self,
        tenant: &Tenant,
        name: &str,
    ) -> DbResult<Option<AtdwProductRow>> {
        let sanitized = sanitize_like(name.trim());
        if sanitized.is_empty() {
            return Ok(None);
        }

        // Tight pass: the stored payload carries the provider title
        // verbatim, so a title-prefix match is near-exact.
        let tight_sql = format!(
            "{select} WHERE payload LIKE ? ORDER BY dateUpdated DESC LIMIT 10",
            select = atdw_select(tenant),
        );
        let tight = sqlx::query_as::<_, AtdwProductRow>(&tight_sql)
            .bind(format!("%\"title\":\"{sanitized}%"))
            .fetch_all(&self.pool)
            .await?;
        if let Some(row) = tight.into_iter().next() {
            return Ok(Some(row));
        }

        let broad_sql = format!(
            "{select} WHERE productName LIKE ? ORDER BY dateUpdated DESC LIMIT 10",
            select = atdw_select(tenant),
        );
        let broad = sqlx::query_as::<_, AtdwProductRow>(&broad_sql)
            .bind(format!("%{sanitized}%"))
            .fetch_all(&self.pool)
            .await?;
        Ok(broad.into_iter().next())
    }

    async fn atdw_import_stats(&self, tenant: &Tenant) -> DbResult<ImportStats> {
        let sql = format!(
            "SELECT COUNT(*) AS total, \
                    COUNT(CASE WHEN imported = 1 THEN 1 END) AS imported, \
                    DATE_FORMAT(MAX(dateUpdated), '%Y-%m-%d %H:%i:%s') AS last_updated \
             FROM {table}",
            table = tenant.qualify("craft_atdw_products"),
        );
        Ok(sqlx::query_as::<_, ImportStats>(&sql)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn region_categories(&self, tenant: &Tenant) -> DbResult<Vec<RegionCategory>> {
        let sql = format!(
            "SELECT cat.id AS id, COALESCE(con.title, '') AS title, \
                    con.field_roam_categories_regionPostcodes AS postcodes \
             FROM {categories} cat \
             INNER JOIN {groups} g ON g.id = cat.groupId \
             INNER JOIN {elements} e ON e.id = cat.id \
             LEFT JOIN {content} con ON con.elementId = cat.id \
             WHERE g.handle = ? \
               AND e.enabled = 1 \
               AND e.dateDeleted IS NULL \
             ORDER BY title ASC",
            categories = tenant.qualify("craft_categories"),
            groups = tenant.qualify("craft_categorygroups"),
            elements = tenant.qualify("craft_elements"),
            content = tenant.qualify("craft_content"),
        );
        let rows = sqlx::query_as::<_, RegionRow>(&sql)
            .bind(REGION_GROUP_HANDLE)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| RegionCategory {
                id: row.id,
                title: row.title,
                postcodes: row
                    .postcodes
                    .as_deref()
                    .map(parse_postcode_table)
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn category_by_slug(
        &self,
        tenant: &Tenant,
        group_handle: &str,
        slug: &str,
    ) -> DbResult<Option<RelatedItem>> {
        let sql = format!(
            "SELECT cat.id AS id, COALESCE(con.title, '') AS title \
             FROM {categories} cat \
             INNER JOIN {groups} g ON g.id = cat.groupId \
             INNER JOIN {sites} es ON es.elementId = cat.id \
             INNER JOIN {elements} e ON e.id = cat.id \
             LEFT JOIN {content} con ON con.elementId = cat.id \
             WHERE g.handle = ? \
               AND es.slug = ? \
               AND e.enabled = 1 \
               AND e.dateDeleted IS NULL \
             LIMIT 1",
            categories = tenant.qualify("craft_categories"),
            groups = tenant.qualify("craft_categorygroups"),
            sites = tenant.qualify("craft_elements_sites"),
            elements = tenant.qualify("craft_elements"),
            content = tenant.qualify("craft_content"),
        );
        Ok(sqlx::query_as::<_, ItemRow>(&sql)
            .bind(group_handle)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| RelatedItem::new(row.id, row.title)))
    }

    async fn related_categories(
        &self,
        tenant: &Tenant,
        source_id: i64,
    ) -> DbResult<Vec<RelatedItem>> {
        let sql = format!(
            "SELECT r.targetId AS id, COALESCE(con.title, '') AS title \
             FROM {relations} r \
             INNER JOIN {categories} cat ON cat.id = r.targetId \
             LEFT JOIN {content} con ON con.elementId = r.targetId \
             WHERE r.sourceId = ? \
             ORDER BY r.sortOrder ASC",
            relations = tenant.qualify("craft_relations"),
            categories = tenant.qualify("craft_categories"),
            content = tenant.qualify("craft_content"),
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(source_id)
            .fetch_all(&self.pool)
            .await?;

        let mut seen = HashSet::new();
        Ok(rows
            .into_iter()
            .filter(|row| seen.insert(row.id))
            .map(|row| RelatedItem::new(row.id, row.title))
            .collect())
    }

    async fn entry_state(&self, tenant: &Tenant, entry_id: i64) -> DbResult<Option<EntryState>> {
        let sql = format!(
            "SELECT e.id AS id, COALESCE(c.title, '') AS title, \
                    CAST(e.enabled AS SIGNED) AS enabled, \
                    en.typeId AS type_id, \
                    CAST(COALESCE(c.field_roam_products_isCustom, 0) AS SIGNED) AS is_custom, \
                    (SELECT COUNT(*) FROM {relations} r \
                       INNER JOIN {categories} cat ON cat.id = r.targetId \
                       WHERE r.sourceId = e.id) AS category_count, \
                    (SELECT COUNT(*) FROM {relations} r \
                       INNER JOIN {assets} a ON a.id = r.targetId \
                       WHERE r.sourceId = e.id) AS image_count, \
                    en.expiryDate AS expiry_date \
             FROM {elements} e \
             INNER JOIN {entries} en ON en.id = e.id \
             LEFT JOIN {content} c ON c.elementId = e.id \
             WHERE e.id = ? \
               AND e.dateDeleted IS NULL \
             LIMIT 1",
            relations = tenant.qualify("craft_relations"),
            categories = tenant.qualify("craft_categories"),
            assets = tenant.qualify("craft_assets"),
            elements = tenant.qualify("craft_elements"),
            entries = tenant.qualify("craft_entries"),
            content = tenant.qualify("craft_content"),
        );
        let row = sqlx::query_as::<_, EntryStateRow>(&sql)
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| EntryState {
            id: row.id,
            title: row.title,
            enabled: row.enabled != 0,
            type_id: row.type_id,
            is_custom: row.is_custom != 0,
            category_count: row.category_count,
            image_count: row.image_count,
            expiry_date: row.expiry_date,
        }))
    }
}

fn atdw_select(tenant: &Tenant) -> String {
    format!(
        "SELECT productId AS product_id, productName AS product_name, \
                category, status, imported, entryId AS entry_id, \
                payload, reason, dateUpdated AS date_updated \
         FROM {table}",
        table = tenant.qualify("craft_atdw_products"),
    )
}

/// Parse the stored region-postcode table field: a JSON array of
/// `{col1, col2}` rows where `col2` carries the postcode.
fn parse_postcode_table(raw: &str) -> Vec<String> {
    let Ok(serde_json::Value::Array(rows)) = serde_json::from_str(raw) else {
        return Vec::new();
    };
    let mut postcodes = Vec::new();
    for row in rows {
        let Some(code) = row.get("col2").and_then(|v| v.as_str()) else {
            continue;
        };
        let code = code.trim();
        if !code.is_empty() && !postcodes.iter().any(|p| p == code) {
            postcodes.push(code.to_string());
        }
    }
    postcodes
}

#[derive(FromRow)]
struct HandleRow {
    id: i64,
    handle: String,
}

#[derive(FromRow)]
struct BlockHeadRow {
    id: i64,
    block_type: String,
    sort_order: i64,
}

#[derive(FromRow)]
struct RelationRow {
    field_handle: String,
    target_id: i64,
    title: String,
}

#[derive(FromRow)]
struct ItemRow {
    id: i64,
    title: String,
}

#[derive(FromRow)]
struct RegionRow {
    id: i64,
    title: String,
    postcodes: Option<String>,
}

#[derive(FromRow)]
struct EntryStateRow {
    id: i64,
    title: String,
    enabled: i64,
    type_id: i64,
    is_custom: i64,
    category_count: i64,
    image_count: i64,
    expiry_date: Option<time::PrimitiveDateTime>,
}
