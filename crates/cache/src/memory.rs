//! Bounded in-memory cache backend.
//!
//! Production deployments sit behind an external KV service; this backend
//! carries the same contract for tests and single-node deployments. It is
//! bounded: once the entry cap is reached, a write first drops expired
//! entries and then, if the cache is still full, evicts arbitrary entries
//! to make room. TTL expiry is lazy on read.

use crate::error::CacheResult;
use crate::store::KvStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Default entry cap for the in-memory backend.
const DEFAULT_MAX_ENTRIES: usize = 10_000;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory [`KvStore`] backend.
pub struct MemoryKvStore {
    entries: DashMap<String, Entry>,
    max_entries: usize,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|e| !e.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_for(&self, incoming: &str) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));

        // Still full: drop arbitrary entries. The cache holds idempotent
        // snapshots, so losing one costs a rebuild, not correctness.
        while self.entries.len() >= self.max_entries {
            let victim = self
                .entries
                .iter()
                .map(|e| e.key().clone())
                .find(|k| k != incoming);
            match victim {
                Some(key) => {
                    self.entries.remove(&key);
                    tracing::debug!(key = %key, "evicted cache entry to stay within bound");
                }
                None => break,
            }
        }
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Expired: remove under the entry lock released above.
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(key) {
            self.evict_for(key);
        }
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
