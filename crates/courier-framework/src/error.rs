//! Error types for the Courier framework.

use thiserror::Error;

use courier_core::{BoxError, CacheError};

/// Errors raised while registering plugins.
#[derive(Debug, Clone, Error)]
pub enum PluginError {
    /// The value handed to the registry is not a plugin.
    #[error("plugin type mismatch: expected '{expected}'")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
    },
}

/// Errors raised by [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The selected handler failed while processing the update.
    ///
    /// The update counts as consumed; no other handler is tried.
    #[error("handler '{handler}' failed")]
    HandlerExecution {
        /// Name of the failing handler.
        handler: String,
        /// The handler's error.
        #[source]
        source: BoxError,
    },

    /// The banned-user lookup could not reach the cache.
    #[error("banned user lookup failed")]
    BanLookup(#[from] CacheError),
}

/// A handler panicked instead of returning an error.
#[derive(Debug, Clone, Error)]
#[error("handler panicked: {0}")]
pub struct HandlerPanicked(pub String);

/// Result type for plugin registration.
pub type PluginResult<T> = Result<T, PluginError>;

/// Result type for dispatch.
pub type DispatchResult<T> = Result<T, DispatchError>;
