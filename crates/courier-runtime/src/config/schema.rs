//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use courier_framework::BANNED_IDS_CACHE_KEY;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierConfig {
    /// Polling task settings.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Cache keys and lifetimes.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Initial state per plugin name.
    #[serde(default)]
    pub plugins: HashMap<String, PluginSettings>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CourierConfig {
    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> ConfigResult<()> {
        let polling = &self.polling;
        if polling.job_name.trim().is_empty() {
            return Err(ConfigError::validation("polling.job_name must not be empty"));
        }
        if polling.offset_key.trim().is_empty() {
            return Err(ConfigError::validation("polling.offset_key must not be empty"));
        }
        if polling.poll_interval_ms == 0 {
            return Err(ConfigError::validation("polling.poll_interval_ms must be positive"));
        }
        if polling.lock_ttl_secs == 0 {
            return Err(ConfigError::validation("polling.lock_ttl_secs must be positive"));
        }
        if self.cache.banned_ids_key.trim().is_empty() {
            return Err(ConfigError::validation("cache.banned_ids_key must not be empty"));
        }
        Ok(())
    }
}

// =============================================================================
// Polling
// =============================================================================

/// What the poller does when a handler fails on an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure, advance the offset past the update and continue.
    #[default]
    Skip,
    /// Stop the batch without advancing; the update is fetched again next cycle.
    Halt,
}

/// Polling task settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Job name; the lock key is `<job_name>-lock`.
    #[serde(default = "default_job_name")]
    pub job_name: String,

    /// Long-poll timeout passed to the transport, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Delay between polling cycles, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Lifetime of the polling lock, in seconds.
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,

    /// Cache key holding the next update offset.
    #[serde(default = "default_offset_key")]
    pub offset_key: String,

    /// Handler failure policy.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            job_name: default_job_name(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            lock_ttl_secs: default_lock_ttl_secs(),
            offset_key: default_offset_key(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl PollingConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }
}

fn default_job_name() -> String {
    "fetch_messages".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_lock_ttl_secs() -> u64 {
    300
}

fn default_offset_key() -> String {
    "last_update_id".to_string()
}

// =============================================================================
// Cache
// =============================================================================

/// Cache keys and lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Key of the cached banned-id set.
    #[serde(default = "default_banned_ids_key")]
    pub banned_ids_key: String,

    /// Lifetime of the banned-id set in seconds; `0` keeps it until invalidated.
    #[serde(default = "default_banned_ids_ttl_secs")]
    pub banned_ids_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            banned_ids_key: default_banned_ids_key(),
            banned_ids_ttl_secs: default_banned_ids_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn banned_ids_ttl(&self) -> Option<Duration> {
        (self.banned_ids_ttl_secs > 0).then(|| Duration::from_secs(self.banned_ids_ttl_secs))
    }
}

fn default_banned_ids_key() -> String {
    BANNED_IDS_CACHE_KEY.to_string()
}

fn default_banned_ids_ttl_secs() -> u64 {
    60
}

// =============================================================================
// Plugins
// =============================================================================

/// Per-plugin settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_enabled() -> bool {
    true
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Target file when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `courier_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of the call site.
    #[serde(default)]
    pub file_location: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CourierConfig::default();

        assert_eq!(config.polling.job_name, "fetch_messages");
        assert_eq!(config.polling.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.polling.lock_ttl(), Duration::from_secs(300));
        assert_eq!(config.polling.offset_key, "last_update_id");
        assert_eq!(config.polling.failure_policy, FailurePolicy::Skip);
        assert_eq!(config.cache.banned_ids_key, BANNED_IDS_CACHE_KEY);
        assert_eq!(config.cache.banned_ids_ttl(), Some(Duration::from_secs(60)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_banned_ttl_means_no_expiry() {
        let cache = CacheConfig {
            banned_ids_ttl_secs: 0,
            ..Default::default()
        };
        assert_eq!(cache.banned_ids_ttl(), None);
    }

    #[test]
    fn test_validation_rejects_zero_interval() {
        let mut config = CourierConfig::default();
        config.polling.poll_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_field_defaults() {
        let config: CourierConfig = serde_json::from_value(serde_json::json!({
            "polling": { "failure_policy": "halt" },
            "plugins": { "weather": { "enabled": false }, "echo": {} }
        }))
        .unwrap();

        assert_eq!(config.polling.failure_policy, FailurePolicy::Halt);
        assert_eq!(config.polling.lock_ttl_secs, 300);
        assert!(!config.plugins["weather"].enabled);
        assert!(config.plugins["echo"].enabled);
    }
}
