//! Error types for the collaborator interfaces.
//!
//! Dispatch-level errors live in `courier-framework`; runtime orchestration
//! errors live in `courier-runtime`.

use thiserror::Error;

/// A boxed error returned by handlers and compute functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised by a [`ChatTransport`](crate::ChatTransport).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The upstream API could not be reached. Treated as transient.
    #[error("network error: {0}")]
    Network(String),

    /// The bot token was rejected or the bot was blocked/removed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The API answered with an error.
    #[error("API error ({code}): {description}")]
    Api {
        /// Error code reported by the API.
        code: i64,
        /// Human readable description.
        description: String,
    },

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` for failures a later poll cycle is expected to recover from.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

// =============================================================================
// Cache Errors
// =============================================================================

/// Errors raised by a [`CacheService`](crate::CacheService).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached.
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded.
    #[error("cache value serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The compute function of `get_or_create` failed.
    #[error("cache value computation failed for '{key}'")]
    Compute {
        /// The key being populated.
        key: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors raised by a [`UserStore`](crate::UserStore).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be queried.
    #[error("user store query failed: {0}")]
    Query(String),
}

// =============================================================================
// Scheduler Errors
// =============================================================================

/// Errors raised by a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    /// No job with the given id exists.
    #[error("job '{0}' not found")]
    JobNotFound(String),

    /// A job with the given id is already scheduled.
    #[error("job '{0}' already exists")]
    JobExists(String),

    /// Backend failure.
    #[error("scheduler error: {0}")]
    Other(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Result type for user store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
