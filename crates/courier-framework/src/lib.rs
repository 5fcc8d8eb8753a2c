//! Courier Framework - handler registry, plugin gate and priority dispatcher.
//!
//! This crate turns a stream of [`Update`](courier_core::Update)s into handler
//! invocations. It knows nothing about where updates come from or how the
//! process is configured; that is the job of `courier-runtime`.
//!
//! # Overview
//!
//! - [`Handler`]: decides whether it wants an update and processes it
//! - [`HandlerRegistry`]: handlers bucketed by priority, in registration order
//! - [`PluginRegistry`]: named, toggleable groups of handlers
//! - [`BannedUserFilter`]: cache-backed lookup of banned senders
//! - [`Dispatcher`]: routes each update to at most one handler
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use courier_framework::*;
//!
//! let plugins = Arc::new(PluginRegistry::new());
//! let handlers = Arc::new(HandlerRegistry::new(plugins.clone()));
//!
//! handlers.register(
//!     on_command("start", |ctx| async move {
//!         ctx.reply("Welcome!").await?;
//!         Ok(())
//!     }),
//!     INTERNAL_PRIORITY,
//!     None,
//! );
//!
//! let banned = Arc::new(BannedUserFilter::new(cache, store));
//! let dispatcher = Dispatcher::new(plugins, handlers, banned);
//! let outcome = dispatcher.dispatch(update, transport).await?;
//! ```

pub mod banned;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod filters;
pub mod handler;
pub mod plugin;
pub mod registry;

#[cfg(test)]
mod testing;

pub use banned::{BANNED_IDS_CACHE_KEY, BannedUserFilter, DEFAULT_BANNED_IDS_TTL};
pub use context::UpdateContext;
pub use dispatcher::{DispatchOutcome, Dispatcher, DropReason};
pub use error::{DispatchError, DispatchResult, HandlerPanicked, PluginError, PluginResult};
pub use filters::Filter;
pub use handler::{
    BoxedHandler, CallbackQueryHandler, CommandHandler, DEFAULT_PRIORITY, Handler,
    HandlerCallback, HandlerResult, INTERNAL_PRIORITY, MessageHandler, into_callback, on_callback,
    on_command, on_message, parse_command,
};
pub use plugin::{Plugin, PluginRegistry};
pub use registry::{HandlerEntry, HandlerRegistry};
