//! Cache and distributed lock interface.
//!
//! A single key/value service backs three concerns of the dispatch core:
//!
//! - the banned-user set (a cached, recomputable value),
//! - the poll offset (a persisted value that must never silently expire),
//! - the polling lock (an entry created with [`CacheService::add`], which only
//!   succeeds when the key is absent, and released with
//!   [`CacheService::delete_if`] so a worker never frees a lock it lost).
//!
//! Values are stored as JSON so any backend that can hold strings can
//! implement the trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::{BoxError, CacheResult};

/// Produces the value for a `get_or_create` miss.
pub type ComputeFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<Value, BoxError>> + Send>;

/// Decides whether a freshly computed value may be stored.
pub type ShouldCacheFn = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// Key/value store with expiry and an atomic create-if-absent primitive.
#[async_trait]
pub trait CacheService: Send + Sync + 'static {
    /// Returns the value under `key`.
    ///
    /// Expired entries are reported as missing unless `ignore_expiration` is
    /// set, in which case the last stored value is returned as long as the
    /// backend still holds it.
    async fn get(&self, key: &str, ignore_expiration: bool) -> CacheResult<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// A `ttl` of `None` stores the value without expiry.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()>;

    /// Removes `key`. Returns `true` if an entry was removed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Removes `key` only while it still holds `expected`, expired or not.
    ///
    /// Returns `true` if an entry was removed. The default implementation
    /// reads and then deletes, so it is not atomic; backends with a
    /// compare-and-delete primitive override it.
    async fn delete_if(&self, key: &str, expected: &Value) -> CacheResult<bool> {
        match self.get(key, true).await? {
            Some(current) if current == *expected => self.delete(key).await,
            _ => Ok(false),
        }
    }

    /// Atomically stores `value` only if `key` is absent or expired.
    ///
    /// Returns `true` if this call created the entry.
    async fn add(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<bool>;

    /// Returns the live value under `key`, computing it on a miss.
    ///
    /// The computed value is stored only when `should_cache` is absent or
    /// returns `true`; it is returned to the caller either way. A failing
    /// compute function is never cached.
    async fn get_or_create(
        &self,
        key: &str,
        compute: ComputeFn,
        ttl: Option<Duration>,
        should_cache: Option<ShouldCacheFn>,
    ) -> CacheResult<Value>;
}

/// A shared cache trait object.
pub type BoxedCache = Arc<dyn CacheService>;
