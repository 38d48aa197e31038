//! Tenant content store for Lantern.
//!
//! This crate talks to the multi-tenant MySQL server that backs the CMS.
//! It provides:
//! - Per-tenant schema resolution (field/section ids, derived table names)
//!   with KV caching
//! - The query layer: page and block resolution, relation harvesting,
//!   nested-set ancestor stripping, postcode search, multi-dimensional
//!   relation queries, and import-record lookups
//!
//! Every table reference is qualified with a validated tenant prefix; the
//! single dynamically derived table name is gated by its own pattern
//! before it is ever spliced into SQL.

pub mod error;
pub mod models;
pub mod mysql;
pub mod schema;
pub mod sql;
pub mod store;

pub use error::{DbError, DbResult};
pub use models::{AtdwProductRow, Block, EntryState, ImportStats, PageRow, RegionCategory, TenantSchema};
pub use mysql::MySqlContentStore;
pub use schema::{invalidate_schema, resolve_schema};
pub use store::ContentStore;

use lantern_core::config::DatabaseConfig;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;
use std::str::FromStr;
use std::time::Duration;

/// Build the shared connection pool from configuration.
///
/// The statement cache is disabled: the upstream connection proxy does not
/// retain server-side prepared statements between requests, so parameters
/// are bound per-execution instead.
pub async fn connect(config: &DatabaseConfig) -> DbResult<MySqlPool> {
    let options = MySqlConnectOptions::from_str(&config.url)?.statement_cache_capacity(0);
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(config.query_timeout_secs))
        .connect_with(options)
        .await?;
    Ok(pool)
}
