//! Banned-user filter.
//!
//! The set of banned user ids is read from the [`UserStore`] and kept in the
//! [`CacheService`] under a well-known key. Lookups only reach the store on a
//! cache miss, so a new ban becomes visible once the cached set expires or is
//! [invalidated](BannedUserFilter::invalidate).
//!
//! A failing store query is never cached and fails the lookup itself, so an
//! unreachable store cannot let a banned user through. The next lookup
//! retries the store.
//!
//! [`UserStore`]: courier_core::UserStore
//! [`CacheService`]: courier_core::CacheService

use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use courier_core::{
    BoxError, BoxedCache, BoxedUserStore, CacheResult, ComputeFn, ShouldCacheFn, UserFilter,
    UserId,
};

/// Default cache key for the banned-id set.
pub const BANNED_IDS_CACHE_KEY: &str = "courier-banned-user-ids";

/// Default lifetime of the cached banned-id set.
pub const DEFAULT_BANNED_IDS_TTL: Duration = Duration::from_secs(60);

/// Cache-backed banned-user lookup.
pub struct BannedUserFilter {
    cache: BoxedCache,
    store: BoxedUserStore,
    key: String,
    ttl: Option<Duration>,
}

impl BannedUserFilter {
    /// Creates a filter with the default key and TTL.
    pub fn new(cache: BoxedCache, store: BoxedUserStore) -> Self {
        Self {
            cache,
            store,
            key: BANNED_IDS_CACHE_KEY.to_string(),
            ttl: Some(DEFAULT_BANNED_IDS_TTL),
        }
    }

    /// Overrides the cache key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Overrides the cache TTL. `None` caches the set until invalidated.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns `true` if `user_id` is in the current banned set.
    ///
    /// Fails with [`CacheError::Compute`](courier_core::CacheError::Compute)
    /// when the set is not cached and the store cannot be queried.
    pub async fn is_banned(&self, user_id: UserId) -> CacheResult<bool> {
        let should_cache: ShouldCacheFn = Box::new(|value: &Value| !value.is_null());
        let banned = self
            .cache
            .get_or_create(
                &self.key,
                self.compute_banned_ids(),
                self.ttl,
                Some(should_cache),
            )
            .await?;

        let hit = contains_id(&banned, user_id);
        if hit {
            debug!(user_id, "User is banned");
        }
        Ok(hit)
    }

    /// Drops the cached set so the next lookup re-reads the store.
    pub async fn invalidate(&self) -> CacheResult<()> {
        self.cache.delete(&self.key).await?;
        Ok(())
    }

    fn compute_banned_ids(&self) -> ComputeFn {
        let store = BoxedUserStore::clone(&self.store);
        Box::new(move || {
            async move {
                match store.list_ids(UserFilter::Banned).await {
                    Ok(ids) => Ok(Value::from(ids)),
                    Err(e) => {
                        warn!(error = %e, "Failed to load banned user ids");
                        Err(BoxError::from(e))
                    }
                }
            }
            .boxed()
        })
    }
}

fn contains_id(value: &Value, user_id: UserId) -> bool {
    value
        .as_array()
        .is_some_and(|ids| ids.iter().any(|id| id.as_i64() == Some(user_id)))
}

impl std::fmt::Debug for BannedUserFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BannedUserFilter")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
