//! Handler system for the Courier framework.
//!
//! A [`Handler`] is a unit that can (a) decide whether it wants an update and
//! (b) process it. The dispatcher offers each update to handlers in priority
//! order and runs only the first one that accepts it.
//!
//! Three handler kinds are provided:
//!
//! - [`CommandHandler`]: matches `/command` messages
//! - [`MessageHandler`]: matches messages through [`filters`](crate::filters)
//! - [`CallbackQueryHandler`]: matches inline keyboard callbacks
//!
//! Custom handlers implement the trait directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_framework::{on_command, on_message, filters};
//!
//! let start = on_command("start", |ctx| async move {
//!     ctx.reply("hello!").await?;
//!     Ok(())
//! });
//!
//! let pics = on_message(|ctx| async move {
//!     ctx.reply("Nice pic").await?;
//!     Ok(())
//! })
//! .filter(filters::photo());
//! ```

mod callback;
mod command;
mod message;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::context::UpdateContext;
use courier_core::{BoxError, Update};

pub use callback::{CallbackQueryHandler, on_callback};
pub use command::{CommandHandler, on_command, parse_command};
pub use message::{MessageHandler, on_message};

/// Priority of internal/system handlers. Always tried first.
pub const INTERNAL_PRIORITY: i32 = 0;

/// Priority used when none is given at registration.
pub const DEFAULT_PRIORITY: i32 = 100;

/// The result of processing an update.
pub type HandlerResult = Result<(), BoxError>;

/// A type-erased async handler callback.
pub type HandlerCallback =
    Arc<dyn Fn(Arc<UpdateContext>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// A shared handler trait object.
pub type BoxedHandler = Arc<dyn Handler>;

/// The core handler trait.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Returns `true` if this handler wants to process `update`.
    fn can_handle(&self, update: &Update) -> bool;

    /// Processes the update.
    async fn process_update(&self, ctx: Arc<UpdateContext>) -> HandlerResult;

    /// The command this handler answers to, for command-type handlers.
    fn command(&self) -> Option<&str> {
        None
    }

    /// Module path of the code that defined this handler.
    ///
    /// Used to associate handlers with plugins when no plugin is given at
    /// registration time.
    fn module(&self) -> Option<&str> {
        None
    }
}

/// Converts an async closure into a [`HandlerCallback`].
pub fn into_callback<F, Fut>(f: F) -> HandlerCallback
where
    F: Fn(Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx: Arc<UpdateContext>| f(ctx).boxed())
}
