use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Handler, HandlerCallback, HandlerResult, into_callback};
use crate::context::UpdateContext;
use crate::filters::Filter;
use courier_core::Update;

/// Handles messages accepted by a set of filters.
///
/// With no filters every message matches. Otherwise a message matches when
/// any filter accepts it, or when all of them do if the handler is
/// [`strict`](MessageHandler::strict).
#[derive(Clone)]
pub struct MessageHandler {
    name: String,
    module: Option<String>,
    filters: Vec<Filter>,
    strict: bool,
    callback: HandlerCallback,
}

impl MessageHandler {
    /// Creates a handler that accepts every message.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: "message".to_string(),
            module: None,
            filters: Vec::new(),
            strict: false,
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

    /// Adds a filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Requires every filter to match instead of any.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[async_trait]
impl Handler for MessageHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, update: &Update) -> bool {
        let Some(message) = update.message.as_ref() else {
            return false;
        };

        if self.filters.is_empty() {
            true
        } else if self.strict {
            self.filters.iter().all(|f| f(message))
        } else {
            self.filters.iter().any(|f| f(message))
        }
    }

    async fn process_update(&self, ctx: Arc<UpdateContext>) -> HandlerResult {
        (self.callback)(ctx).await
    }

    fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }
}

impl std::fmt::Debug for MessageHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHandler")
            .field("name", &self.name)
            .field("filters", &self.filters.len())
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

/// Creates a [`MessageHandler`].
pub fn on_message<F, Fut>(f: F) -> MessageHandler
where
    F: Fn(Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    MessageHandler::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters;
    use courier_core::{Message, User};

    fn update(text: &str) -> Update {
        Update::from_message(3, Message::text(1, User::new(1, "u"), text))
    }

    fn handler() -> MessageHandler {
        MessageHandler::new(|_| async { Ok(()) })
    }

    #[test]
    fn test_unfiltered_matches_any_message() {
        assert!(handler().can_handle(&update("anything")));
        assert!(!handler().can_handle(&Update {
            update_id: 1,
            message: None,
            callback_query: None,
        }));
    }

    #[test]
    fn test_lenient_filters_need_one_match() {
        let h = handler()
            .filter(filters::photo())
            .filter(filters::text_in(["hi"]));
        assert!(h.can_handle(&update("hi")));
        assert!(!h.can_handle(&update("bye")));
    }

    #[test]
    fn test_strict_filters_need_all_matches() {
        let h = handler()
            .filter(filters::text())
            .filter(filters::text_in(["hola", "hi", "klk", "hey"]))
            .strict(true);
        assert!(h.can_handle(&update("klk")));
        assert!(!h.can_handle(&update("good morning")));
    }
}
