//! SQL composition helpers.
//!
//! Everything spliced into query text (as opposed to bound) funnels
//! through this module: the tenant prefix is validated by construction in
//! `lantern_core::Tenant`, and the matrix-content table name is gated here.

use crate::error::{DbError, DbResult};
use regex::Regex;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static MATRIX_TABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^craft_matrixcontent_[a-z0-9_]+$").expect("matrix table pattern compiles")
});

/// Gate a derived matrix-content table name before composition.
pub fn checked_matrix_table(name: &str) -> DbResult<&str> {
    if MATRIX_TABLE_PATTERN.is_match(name) {
        Ok(name)
    } else {
        Err(DbError::InvalidTableName(name.to_string()))
    }
}

/// A `?, ?, ...` list for `IN` clauses. Callers must not pass an empty
/// slice; queries over empty id sets are short-circuited before SQL is
/// composed.
pub fn placeholders(count: usize) -> String {
    debug_assert!(count > 0);
    let mut out = String::with_capacity(count * 3);
    for i in 0..count {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('?');
    }
    out
}

/// Strip characters that would act as wildcards or escapes inside a LIKE
/// pattern built from user-supplied text.
pub fn sanitize_like(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '"' | '%' | '\\'))
        .collect()
}

/// The search index stores keywords padded with spaces, so an exact token
/// match is a LIKE over `% token %`.
pub fn keyword_pattern(token: &str) -> String {
    format!("% {} %", sanitize_like(token.trim()))
}

/// URI candidates for page resolution, most specific first. Empty and
/// root URIs resolve to the CMS's `__home__` marker.
pub fn page_uri_candidates(uri: &str) -> Vec<String> {
    let trimmed = uri.trim();
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |candidate: String| {
        if !candidate.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    if trimmed.is_empty() || trimmed == "/" {
        push("__home__".to_string());
        return candidates;
    }

    push(trimmed.to_string());
    push(trimmed.trim_start_matches('/').to_string());
    if !trimmed.starts_with('/') {
        push(format!("/{trimmed}"));
    }
    candidates
}

/// Decode a wildcard-selected row into a keyed map.
///
/// The matrix-content table has one column per block-type field, so the
/// column set is only known at runtime. Values are probed in order of the
/// types the driver reports for this schema: integers, floats, then text;
/// anything undecodable becomes null.
pub fn row_to_map(row: &MySqlRow) -> BTreeMap<String, serde_json::Value> {
    let mut map = BTreeMap::new();
    for column in row.columns() {
        let name = column.name().to_string();
        let value = match column.type_info().name() {
            "TINYINT" | "SMALLINT" | "INT" | "MEDIUMINT" | "BIGINT" => row
                .try_get::<Option<i64>, _>(column.ordinal())
                .ok()
                .flatten()
                .map(serde_json::Value::from),
            "FLOAT" | "DOUBLE" | "DECIMAL" => row
                .try_get::<Option<f64>, _>(column.ordinal())
                .ok()
                .flatten()
                .map(serde_json::Value::from),
            _ => row
                .try_get::<Option<String>, _>(column.ordinal())
                .ok()
                .flatten()
                .map(serde_json::Value::from),
        };
        map.insert(name, value.unwrap_or(serde_json::Value::Null));
    }
    map
}

/// Columns of the matrix-content table that carry bookkeeping rather than
/// authored field values.
pub const INTERNAL_COLUMNS: &[&str] = &[
    "id",
    "elementId",
    "siteId",
    "dateCreated",
    "dateUpdated",
    "uid",
];

/// Trim a matrix-content column name down to the field key authors know:
/// `field_products_limit` becomes `limit` for the `products` block type.
pub fn field_key(column: &str, block_type: &str) -> Option<String> {
    if INTERNAL_COLUMNS.contains(&column) {
        return None;
    }
    let rest = column.strip_prefix("field_")?;
    let key = rest
        .strip_prefix(block_type)
        .and_then(|r| r.strip_prefix('_'))
        .unwrap_or(rest);
    Some(key.to_string())
}
