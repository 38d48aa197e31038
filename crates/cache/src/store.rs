//! Cache trait definition.

use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// A shared key/value cache with per-entry TTLs.
///
/// Entries are immutable once written; an overwrite is a new entry. Writes
/// are last-write-wins, which is tolerated because every stored value is an
/// idempotent snapshot. Implementations must be safe to share across
/// concurrent requests.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a value. Expired entries read as absent.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a value, replacing any previous entry for the key.
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    /// Remove an entry. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;
}
