//! Lock-guarded polling task.
//!
//! One [`Poller::poll_once`] call is one polling cycle:
//!
//! 1. Take the `<job>-lock` key with [`CacheService::add`]. If another worker
//!    holds it, return [`PollOutcome::Contended`] without touching the
//!    transport.
//! 2. Read the stored offset (expired or not) and fetch updates from there.
//! 3. Dispatch each update in order and persist `update_id + 1` after it.
//! 4. Delete the lock, whatever happened in between.
//!
//! The lock TTL bounds how long a crashed worker can block the others. Each
//! cycle stores a fresh token as the lock value and only deletes the lock
//! while it still holds that token, so a cycle that outlived its TTL never
//! frees the lock of the worker that took over.
//!
//! [`CacheService::add`]: courier_core::CacheService::add

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{FailurePolicy, PollingConfig};
use crate::error::{RuntimeError, RuntimeResult};
use courier_core::{BoxedCache, BoxedTransport, CacheError, TransportError};
use courier_framework::{DispatchError, Dispatcher};

/// Counters for one completed polling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Updates returned by the transport.
    pub fetched: usize,
    /// Updates a handler processed successfully.
    pub consumed: usize,
    /// Updates dropped as banned, unmatched or senderless.
    pub dropped: usize,
    /// Updates whose handler failed.
    pub failed: usize,
    /// The stored offset after the cycle.
    pub offset: Option<i64>,
}

/// The result of one polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Another worker holds the lock; nothing was fetched.
    Contended,
    /// The transport rejected the credentials.
    Unauthorized,
    /// The batch was fetched and dispatched.
    Completed(PollStats),
}

/// Fetches updates under a distributed lock and feeds them to a dispatcher.
pub struct Poller {
    transport: BoxedTransport,
    cache: BoxedCache,
    dispatcher: Dispatcher,
    job_name: String,
    offset_key: String,
    lock_ttl: Duration,
    fetch_timeout: Duration,
    failure_policy: FailurePolicy,
}

impl Poller {
    /// Creates a poller with default settings.
    pub fn new(transport: BoxedTransport, cache: BoxedCache, dispatcher: Dispatcher) -> Self {
        Self::from_config(transport, cache, dispatcher, &PollingConfig::default())
    }

    pub fn from_config(
        transport: BoxedTransport,
        cache: BoxedCache,
        dispatcher: Dispatcher,
        config: &PollingConfig,
    ) -> Self {
        Self {
            transport,
            cache,
            dispatcher,
            job_name: config.job_name.clone(),
            offset_key: config.offset_key.clone(),
            lock_ttl: config.lock_ttl(),
            fetch_timeout: config.fetch_timeout(),
            failure_policy: config.failure_policy,
        }
    }

    pub fn job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = name.into();
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    /// Cache key of the polling lock.
    pub fn lock_key(&self) -> String {
        format!("{}-lock", self.job_name)
    }

    /// The stored offset, ignoring expiry.
    ///
    /// A stored value that is not an integer is an error rather than a reset.
    pub async fn current_offset(&self) -> RuntimeResult<Option<i64>> {
        match self.cache.get(&self.offset_key, true).await? {
            Some(stored) => {
                let offset = serde_json::from_value(stored).map_err(CacheError::from)?;
                Ok(Some(offset))
            }
            None => Ok(None),
        }
    }

    /// Runs one polling cycle.
    ///
    /// Transport errors other than network and authorization failures, cache
    /// errors, and handler errors under [`FailurePolicy::Halt`] are returned
    /// after the lock has been released. A panic during the cycle is resumed
    /// after releasing the lock.
    pub async fn poll_once(&self) -> RuntimeResult<PollOutcome> {
        let lock_key = self.lock_key();
        let token = Value::String(Uuid::new_v4().to_string());
        if !self
            .cache
            .add(&lock_key, token.clone(), Some(self.lock_ttl))
            .await?
        {
            info!(job = %self.job_name, "Job already running, skipping cycle");
            return Ok(PollOutcome::Contended);
        }

        let result = AssertUnwindSafe(self.poll_locked()).catch_unwind().await;

        match self.cache.delete_if(&lock_key, &token).await {
            Ok(true) => {}
            Ok(false) => warn!(
                job = %self.job_name,
                "Polling lock expired before release and was not deleted"
            ),
            Err(e) => error!(job = %self.job_name, error = %e, "Failed to release polling lock"),
        }

        match result {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn poll_locked(&self) -> RuntimeResult<PollOutcome> {
        let mut offset = self.current_offset().await?;

        let updates = match self.transport.fetch_updates(offset, self.fetch_timeout).await {
            Ok(updates) => updates,
            Err(e) if e.is_transient() => {
                info!(reason = %e, "No more updates");
                Vec::new()
            }
            Err(TransportError::Unauthorized(reason)) => {
                error!(%reason, "Transport rejected credentials");
                return Ok(PollOutcome::Unauthorized);
            }
            Err(e) => return Err(e.into()),
        };

        let mut stats = PollStats {
            fetched: updates.len(),
            offset,
            ..Default::default()
        };
        debug!(fetched = stats.fetched, ?offset, "Fetched updates");

        for update in updates {
            let update_id = update.update_id;

            match self
                .dispatcher
                .dispatch(update, Arc::clone(&self.transport))
                .await
            {
                Ok(outcome) if outcome.is_consumed() => stats.consumed += 1,
                Ok(_) => stats.dropped += 1,
                Err(err @ DispatchError::HandlerExecution { .. }) => {
                    stats.failed += 1;
                    match self.failure_policy {
                        FailurePolicy::Skip => {
                            warn!(update_id, error = %err, "Skipping update after handler failure");
                        }
                        FailurePolicy::Halt => {
                            warn!(update_id, error = %err, "Halting batch after handler failure");
                            return Err(RuntimeError::Dispatch(err));
                        }
                    }
                }
                Err(err) => return Err(err.into()),
            }

            let next = update_id + 1;
            if offset.is_none_or(|current| next > current) {
                self.cache
                    .set(&self.offset_key, Value::from(next), None)
                    .await?;
                offset = Some(next);
            }
            stats.offset = offset;
        }

        Ok(PollOutcome::Completed(stats))
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("job_name", &self.job_name)
            .field("offset_key", &self.offset_key)
            .field("lock_ttl", &self.lock_ttl)
            .field("failure_policy", &self.failure_policy)
            .finish_non_exhaustive()
    }
}
