//! Database models for the tenant content schema.

use lantern_core::component::RelatedItem;
use lantern_core::SCHEMA_TTL;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Per-tenant schema snapshot: well-known handles resolved to numeric ids
/// plus the derived matrix-content table name. Stored in the KV cache
/// under `schema:{tenant}` for one hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSchema {
    /// Field handle to field id. Block-type-context fields are keyed by
    /// their raw handle; global fields are keyed `global:{handle}`.
    pub fields: BTreeMap<String, i64>,
    /// Section handle to section id.
    pub sections: BTreeMap<String, i64>,
    /// Derived matrix-content table, `craft_matrixcontent_{field handle}`.
    pub matrix_content_table: String,
    #[serde(with = "time::serde::rfc3339")]
    pub cached_at: OffsetDateTime,
}

impl TenantSchema {
    /// Whether this snapshot is still within its TTL.
    pub fn is_fresh(&self, now: OffsetDateTime) -> bool {
        now - self.cached_at < SCHEMA_TTL
    }

    /// A block-type-context field id by raw handle.
    pub fn field(&self, handle: &str) -> Option<i64> {
        self.fields.get(handle).copied()
    }

    /// A global-context field id.
    pub fn global_field(&self, handle: &str) -> Option<i64> {
        self.fields.get(&format!("global:{handle}")).copied()
    }

    pub fn section(&self, handle: &str) -> Option<i64> {
        self.sections.get(handle).copied()
    }
}

/// A resolved page: the enabled, live entry matching a request URI.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PageRow {
    pub id: i64,
    pub title: String,
    pub uri: Option<String>,
}

/// One page-builder block with its relations and stored field values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub block_id: i64,
    /// Block type handle, e.g. `products` or `imageGallery`.
    pub block_type: String,
    pub sort_order: i64,
    /// Matrix-content columns for this block, keyed by trimmed column
    /// name. Values keep whatever scalar type the driver reported.
    pub field_values: BTreeMap<String, serde_json::Value>,
    /// Relation lists keyed by field handle, in server-side sort order.
    pub relations: BTreeMap<String, Vec<RelatedItem>>,
}

impl Block {
    /// A scalar field value as a string, if present and non-null.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.field_values.get(key).and_then(|v| v.as_str())
    }

    /// A scalar field value as an integer, accepting numeric strings.
    pub fn field_i64(&self, key: &str) -> Option<i64> {
        match self.field_values.get(key)? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Relations for a handle, or an empty list.
    pub fn relation(&self, handle: &str) -> &[RelatedItem] {
        self.relations.get(handle).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A row of the ATDW import ledger.
#[derive(Debug, Clone, FromRow)]
pub struct AtdwProductRow {
    pub product_id: String,
    pub product_name: String,
    pub category: Option<String>,
    pub status: Option<String>,
    pub imported: bool,
    pub entry_id: Option<i64>,
    /// Raw provider payload as stored at import time.
    pub payload: Option<String>,
    /// Audit reason recorded when the importer skipped or failed a record.
    pub reason: Option<String>,
    pub date_updated: Option<PrimitiveDateTime>,
}

/// Table-level statistics for the import ledger, reported when a lookup
/// misses.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct ImportStats {
    pub total: i64,
    pub imported: i64,
    pub last_updated: Option<String>,
}

/// One enabled product-region category with its parsed postcode set.
#[derive(Debug, Clone, Serialize)]
pub struct RegionCategory {
    pub id: i64,
    pub title: String,
    pub postcodes: Vec<String>,
}

/// Current CMS state of a product entry, with related-element counts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EntryState {
    pub id: i64,
    pub title: String,
    pub enabled: bool,
    pub type_id: i64,
    pub is_custom: bool,
    pub category_count: i64,
    pub image_count: i64,
    pub expiry_date: Option<PrimitiveDateTime>,
}
