use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Handler, HandlerCallback, HandlerResult, into_callback};
use crate::context::UpdateContext;
use courier_core::Update;

/// Splits `/command@bot rest` into `("command", "rest")`.
///
/// Returns `None` if `text` does not start with a command token.
pub fn parse_command(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix('/')?;
    let (token, rest) = match body.find(char::is_whitespace) {
        Some(idx) => (&body[..idx], body[idx..].trim_start()),
        None => (body, ""),
    };
    let command = token.split_once('@').map_or(token, |(cmd, _bot)| cmd);

    if command.is_empty() {
        None
    } else {
        Some((command, rest))
    }
}

/// Handles messages whose first token is `/command`.
#[derive(Clone)]
pub struct CommandHandler {
    command: String,
    name: String,
    module: Option<String>,
    description: Option<String>,
    callback: HandlerCallback,
}

impl CommandHandler {
    /// Creates a handler for `/command`.
    pub fn new<F, Fut>(command: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let command = command.into();
        Self {
            name: format!("command:{command}"),
            command,
            module: None,
            description: None,
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

    /// Sets the help text shown in command listings.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the help text, if set.
    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[async_trait]
impl Handler for CommandHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, update: &Update) -> bool {
        update
            .message
            .as_ref()
            .and_then(|m| m.text.as_deref())
            .and_then(parse_command)
            .is_some_and(|(command, _)| command == self.command)
    }

    async fn process_update(&self, ctx: Arc<UpdateContext>) -> HandlerResult {
        (self.callback)(ctx).await
    }

    fn command(&self) -> Option<&str> {
        Some(&self.command)
    }

    fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("command", &self.command)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

/// Creates a [`CommandHandler`] for `/command`.
pub fn on_command<F, Fut>(command: impl Into<String>, f: F) -> CommandHandler
where
    F: Fn(Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    CommandHandler::new(command, f)
}
