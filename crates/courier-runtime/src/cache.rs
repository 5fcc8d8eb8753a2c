//! In-process [`CacheService`] implementation.
//!
//! `MemoryCache` serves single-host deployments and tests. Entries carry an
//! optional deadline measured on the tokio clock. Expired entries stay in the
//! map until overwritten or deleted, so `get(key, true)` can still return them.
//!
//! Its `add` is atomic within the process only; workers on several hosts need
//! a shared backend behind the same trait.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;
use tracing::trace;

use courier_core::{CacheError, CacheResult, CacheService, ComputeFn, ShouldCacheFn};

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_live(&self) -> bool {
        self.expires_at.is_none_or(|deadline| Instant::now() < deadline)
    }
}

/// Mutex-guarded map cache with per-entry expiry.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn live_value(&self, key: &str) -> Option<Value> {
        self.entries
            .lock()
            .get(key)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value.clone())
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str, ignore_expiration: bool) -> CacheResult<Option<Value>> {
        if ignore_expiration {
            return Ok(self.entries.lock().get(key).map(|e| e.value.clone()));
        }
        Ok(self.live_value(key))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()> {
        trace!(key, ?ttl, "cache set");
        self.entries
            .lock()
            .insert(key.to_string(), Entry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.lock().remove(key).is_some())
    }

    async fn delete_if(&self, key: &str, expected: &Value) -> CacheResult<bool> {
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|entry| entry.value == *expected) {
            entries.remove(key);
            return Ok(true);
        }
        Ok(false)
    }

    async fn add(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<bool> {
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(Entry::is_live) {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(true)
    }

    async fn get_or_create(
        &self,
        key: &str,
        compute: ComputeFn,
        ttl: Option<Duration>,
        should_cache: Option<ShouldCacheFn>,
    ) -> CacheResult<Value> {
        if let Some(value) = self.live_value(key) {
            return Ok(value);
        }

        trace!(key, "cache miss, computing");
        let value = compute().await.map_err(|source| CacheError::Compute {
            key: key.to_string(),
            source,
        })?;

        if !should_cache.is_none_or(|accept| accept(&value)) {
            return Ok(value);
        }

        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(key).filter(|e| e.is_live()) {
            return Ok(existing.value.clone());
        }
        entries.insert(key.to_string(), Entry::new(value.clone(), ttl));
        Ok(value)
    }
}
