//! # Courier
//!
//! Message-dispatch core for polling chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   lock    ┌───────┐
//! │  Poller  │──────────▶│ Cache │◀──── banned ids, offset
//! └────┬─────┘           └───────┘
//!      │ fetch                ▲
//!      ▼                      │
//! ┌──────────┐   update   ┌────────────┐   first match   ┌─────────┐
//! │Transport │───────────▶│ Dispatcher │────────────────▶│ Handler │
//! └──────────┘            └────────────┘                 └─────────┘
//!                          │ priority order, plugin gate
//!                          ▼
//!                    HandlerRegistry / PluginRegistry
//! ```
//!
//! - **Core** (`courier::core`): update model and collaborator traits
//! - **Framework** (`courier::framework`): handlers, filters, registries, dispatcher
//! - **Runtime** (`courier::runtime`): config, logging, cache, poller, `Courier`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let courier = Courier::builder(transport, users).load_config()?.build();
//!
//!     courier.add_plugin(Plugin::new("Echo", "echo"));
//!     courier.add_handler(
//!         on_message(|ctx| async move {
//!             if let Some(text) = ctx.text() {
//!                 ctx.reply(text).await?;
//!             }
//!             Ok(())
//!         })
//!         .filter(filters::text()),
//!         DEFAULT_PRIORITY,
//!         Some("Echo"),
//!     );
//!
//!     courier.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): load `courier.toml`
//! - `yaml-config`: load `courier.yaml`
//! - `json-log`: JSON log lines

pub use courier_core as core;
pub use courier_framework as framework;
pub use courier_runtime as runtime;

/// Commonly used types for building a bot.
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    // Runtime entry point
    pub use courier_runtime::{Courier, CourierConfig, FailurePolicy, PollOutcome};

    // Handlers and registration
    pub use courier_framework::{
        CallbackQueryHandler, CommandHandler, DEFAULT_PRIORITY, DispatchOutcome, DropReason,
        Handler, HandlerResult, INTERNAL_PRIORITY, MessageHandler, Plugin, UpdateContext, filters,
        on_callback, on_command, on_message,
    };

    // Collaborator traits for custom implementations
    pub use courier_core::{
        CacheService, ChatTransport, Message, ParseMode, Scheduler, Update, User, UserStore,
    };

    pub use courier_runtime::prelude::*;
}
