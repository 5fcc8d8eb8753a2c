//! Update dispatcher for the Courier framework.
//!
//! The [`Dispatcher`] routes one update to at most one handler:
//!
//! 1. The sender is resolved (callback sender first, then message sender)
//! 2. Updates from banned users are dropped
//! 3. Handlers are tried in ascending priority, registration order within a
//!    priority, skipping handlers whose plugin is disabled
//! 4. The first handler whose `can_handle` accepts the update processes it,
//!    and dispatch stops there
//!
//! The result is a [`DispatchOutcome`] so callers can tell a consumed update
//! from a dropped one without inspecting logs. A handler failure is returned
//! as [`DispatchError::HandlerExecution`]; panics inside a handler are
//! reported the same way.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(plugins, handlers, banned);
//! match dispatcher.dispatch(update, transport).await? {
//!     DispatchOutcome::Consumed { handler, .. } => info!(%handler, "handled"),
//!     DispatchOutcome::Dropped(reason) => debug!(?reason, "dropped"),
//! }
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{Instrument, debug, debug_span, error, trace};

use crate::banned::BannedUserFilter;
use crate::context::UpdateContext;
use crate::error::{DispatchError, DispatchResult, HandlerPanicked};
use crate::plugin::PluginRegistry;
use crate::registry::{HandlerEntry, HandlerRegistry};
use courier_core::{BoxedTransport, Update};

/// Why an update was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The sender is banned.
    Banned,
    /// No enabled handler accepted the update.
    NoMatch,
    /// The update carries neither a message nor a callback query.
    NoSender,
}

/// The result of dispatching one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler processed the update successfully.
    Consumed {
        /// Name of the handler.
        handler: String,
        /// Priority it was registered at.
        priority: i32,
    },
    /// No handler ran.
    Dropped(DropReason),
}

impl DispatchOutcome {
    pub fn is_consumed(&self) -> bool {
        matches!(self, Self::Consumed { .. })
    }
}

/// Routes updates to the first eligible handler.
#[derive(Clone)]
pub struct Dispatcher {
    plugins: Arc<PluginRegistry>,
    handlers: Arc<HandlerRegistry>,
    banned: Arc<BannedUserFilter>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given registries.
    pub fn new(
        plugins: Arc<PluginRegistry>,
        handlers: Arc<HandlerRegistry>,
        banned: Arc<BannedUserFilter>,
    ) -> Self {
        Self {
            plugins,
            handlers,
            banned,
        }
    }

    pub fn handlers(&self) -> &Arc<HandlerRegistry> {
        &self.handlers
    }

    pub fn plugins(&self) -> &Arc<PluginRegistry> {
        &self.plugins
    }

    /// Dispatches `update`, replying through `transport`.
    pub async fn dispatch(
        &self,
        update: Update,
        transport: BoxedTransport,
    ) -> DispatchResult<DispatchOutcome> {
        let span = debug_span!("dispatch", update_id = update.update_id);
        self.dispatch_inner(update, transport).instrument(span).await
    }

    async fn dispatch_inner(
        &self,
        update: Update,
        transport: BoxedTransport,
    ) -> DispatchResult<DispatchOutcome> {
        let Some(user_id) = update.sender().map(|user| user.id) else {
            debug!("Update has no sender, dropping");
            return Ok(DispatchOutcome::Dropped(DropReason::NoSender));
        };

        if self.banned.is_banned(user_id).await? {
            debug!(user_id, "Dropping update from banned user");
            return Ok(DispatchOutcome::Dropped(DropReason::Banned));
        }

        debug!(user_id, "Processing update");

        for entry in self.handlers.snapshot() {
            trace!(handler = entry.name(), priority = entry.priority(), "Trying handler");

            if !self.is_enabled(&entry) {
                continue;
            }
            if !entry.handler().can_handle(&update) {
                continue;
            }

            debug!(handler = entry.name(), "Using handler");
            let ctx = Arc::new(UpdateContext::new(update, transport));
            return Self::run(&entry, ctx).await;
        }

        debug!("No handler matched, dropping");
        Ok(DispatchOutcome::Dropped(DropReason::NoMatch))
    }

    fn is_enabled(&self, entry: &HandlerEntry) -> bool {
        entry
            .plugin()
            .is_none_or(|plugin| self.plugins.is_enabled(plugin))
    }

    async fn run(entry: &HandlerEntry, ctx: Arc<UpdateContext>) -> DispatchResult<DispatchOutcome> {
        let result = AssertUnwindSafe(entry.handler().process_update(ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(HandlerPanicked(panic_message(&*panic)).into()));

        match result {
            Ok(()) => Ok(DispatchOutcome::Consumed {
                handler: entry.name().to_string(),
                priority: entry.priority(),
            }),
            Err(source) => {
                error!(handler = entry.name(), error = %source, "Handler failed");
                Err(DispatchError::HandlerExecution {
                    handler: entry.name().to_string(),
                    source,
                })
            }
        }
    }
}

/// Extracts the message of a caught panic payload.
pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler_count", &self.handlers.len())
            .field("plugin_count", &self.plugins.len())
            .finish()
    }
}
