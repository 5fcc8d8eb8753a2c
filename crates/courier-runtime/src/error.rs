//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use courier_core::{CacheError, SchedulerError, StoreError, TransportError};
use courier_framework::{DispatchError, PluginError};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A scheduler operation was requested but no scheduler is configured.
    #[error("No scheduler configured")]
    SchedulerUnavailable,

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("User store error: {0}")]
    Store(#[from] StoreError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
