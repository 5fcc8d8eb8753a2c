//! In-memory collaborators shared by the framework's unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use courier_core::{
    CacheError, CacheResult, CacheService, ChatId, ChatTransport, ComputeFn, ParseMode,
    ShouldCacheFn, StoreError, StoreResult, StoredUser, TransportResult, Update, UserFilter,
    UserId, UserStore,
};

/// Cache without expiry.
#[derive(Default)]
pub struct FakeCache {
    values: Mutex<HashMap<String, Value>>,
}

impl FakeCache {
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }
}

#[async_trait]
impl CacheService for FakeCache {
    async fn get(&self, key: &str, _ignore_expiration: bool) -> CacheResult<Option<Value>> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: Value, _ttl: Option<Duration>) -> CacheResult<()> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.values.lock().remove(key).is_some())
    }

    async fn add(&self, key: &str, value: Value, _ttl: Option<Duration>) -> CacheResult<bool> {
        let mut values = self.values.lock();
        if values.contains_key(key) {
            return Ok(false);
        }
        values.insert(key.to_string(), value);
        Ok(true)
    }

    async fn get_or_create(
        &self,
        key: &str,
        compute: ComputeFn,
        _ttl: Option<Duration>,
        should_cache: Option<ShouldCacheFn>,
    ) -> CacheResult<Value> {
        if let Some(value) = self.raw(key) {
            return Ok(value);
        }
        let value = compute().await.map_err(|source| CacheError::Compute {
            key: key.to_string(),
            source,
        })?;
        if should_cache.is_none_or(|f| f(&value)) {
            self.values.lock().insert(key.to_string(), value.clone());
        }
        Ok(value)
    }
}

/// Cache whose every call fails.
pub struct BrokenCache;

#[async_trait]
impl CacheService for BrokenCache {
    async fn get(&self, _key: &str, _ignore_expiration: bool) -> CacheResult<Option<Value>> {
        Err(CacheError::Unavailable("down".into()))
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Option<Duration>) -> CacheResult<()> {
        Err(CacheError::Unavailable("down".into()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::Unavailable("down".into()))
    }

    async fn add(&self, _key: &str, _value: Value, _ttl: Option<Duration>) -> CacheResult<bool> {
        Err(CacheError::Unavailable("down".into()))
    }

    async fn get_or_create(
        &self,
        _key: &str,
        _compute: ComputeFn,
        _ttl: Option<Duration>,
        _should_cache: Option<ShouldCacheFn>,
    ) -> CacheResult<Value> {
        Err(CacheError::Unavailable("down".into()))
    }
}

/// User store backed by a list of records.
#[derive(Default)]
pub struct FakeStore {
    users: Mutex<Vec<StoredUser>>,
    banned_queries: AtomicUsize,
    fail_next: AtomicBool,
}

impl FakeStore {
    pub fn with_banned(ids: impl IntoIterator<Item = UserId>) -> Self {
        let store = Self::default();
        for id in ids {
            store.ban(id);
        }
        store
    }

    pub fn ban(&self, id: UserId) {
        self.users.lock().push(StoredUser {
            id,
            username: None,
            role: "user".into(),
            banned: true,
        });
    }

    pub fn fail_next_query(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn banned_queries(&self) -> usize {
        self.banned_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for FakeStore {
    async fn list_ids(&self, filter: UserFilter) -> StoreResult<Vec<UserId>> {
        if filter == UserFilter::Banned {
            self.banned_queries.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Query("connection reset".into()));
        }
        Ok(self
            .users
            .lock()
            .iter()
            .filter(|u| u.matches(&filter))
            .map(|u| u.id)
            .collect())
    }

    async fn list_users(&self, filter: UserFilter) -> StoreResult<Vec<StoredUser>> {
        Ok(self
            .users
            .lock()
            .iter()
            .filter(|u| u.matches(&filter))
            .cloned()
            .collect())
    }
}

/// Transport that records outgoing messages and serves no updates.
#[derive(Default)]
pub struct FakeTransport {
    pub sent: Mutex<Vec<(ChatId, String)>>,
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn fetch_updates(
        &self,
        _offset: Option<i64>,
        _timeout: Duration,
    ) -> TransportResult<Vec<Update>> {
        Ok(Vec::new())
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        _parse_mode: ParseMode,
    ) -> TransportResult<i64> {
        let mut sent = self.sent.lock();
        sent.push((chat_id, text.to_string()));
        Ok(sent.len() as i64)
    }
}
