use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Handler, HandlerCallback, HandlerResult, into_callback};
use crate::context::UpdateContext;
use courier_core::Update;

/// Handles callback queries, optionally restricted to a data prefix.
#[derive(Clone)]
pub struct CallbackQueryHandler {
    name: String,
    module: Option<String>,
    prefix: Option<String>,
    callback: HandlerCallback,
}

impl CallbackQueryHandler {
    /// Creates a handler accepting every callback query.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: "callback".to_string(),
            module: None,
            prefix: None,
            callback: into_callback(f),
        }
    }

    /// Overrides the log name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Records the defining module, usually `module_path!()`.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Only accept callbacks whose data starts with `prefix`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

#[async_trait]
impl Handler for CallbackQueryHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, update: &Update) -> bool {
        let Some(query) = update.callback_query.as_ref() else {
            return false;
        };

        match (&self.prefix, query.data.as_deref()) {
            (None, _) => true,
            (Some(prefix), Some(data)) => data.starts_with(prefix.as_str()),
            (Some(_), None) => false,
        }
    }

    async fn process_update(&self, ctx: Arc<UpdateContext>) -> HandlerResult {
        (self.callback)(ctx).await
    }

    fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }
}

impl std::fmt::Debug for CallbackQueryHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackQueryHandler")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Creates a [`CallbackQueryHandler`].
pub fn on_callback<F, Fut>(f: F) -> CallbackQueryHandler
where
    F: Fn(Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    CallbackQueryHandler::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{CallbackQuery, Message, User};

    fn callback(data: Option<&str>) -> Update {
        Update::from_callback(
            9,
            CallbackQuery {
                id: "q".into(),
                from: User::new(3, "c"),
                message: None,
                data: data.map(str::to_string),
            },
        )
    }

    #[test]
    fn test_prefix_matching() {
        let h = CallbackQueryHandler::new(|_| async { Ok(()) }).prefix("vote:");
        assert!(h.can_handle(&callback(Some("vote:up"))));
        assert!(!h.can_handle(&callback(Some("poll:1"))));
        assert!(!h.can_handle(&callback(None)));
    }

    #[test]
    fn test_ignores_messages() {
        let h = CallbackQueryHandler::new(|_| async { Ok(()) });
        assert!(h.can_handle(&callback(None)));
        let msg = Update::from_message(1, Message::text(1, User::new(1, "a"), "x"));
        assert!(!h.can_handle(&msg));
    }
}
