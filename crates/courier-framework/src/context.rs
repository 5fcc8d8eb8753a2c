//! Per-update context handed to handlers.
//!
//! One [`UpdateContext`] is created for the handler selected by the dispatcher.
//! It owns the update and a handle to the transport so handlers can reply
//! without capturing the transport themselves.

use courier_core::{
    BoxedTransport, ChatId, Message, ParseMode, TransportError, TransportResult, Update, User,
};

/// The context of a single dispatched update.
pub struct UpdateContext {
    update: Update,
    transport: BoxedTransport,
}

impl UpdateContext {
    /// Creates a new context.
    pub fn new(update: Update, transport: BoxedTransport) -> Self {
        Self { update, transport }
    }

    /// The update being processed.
    pub fn update(&self) -> &Update {
        &self.update
    }

    /// The transport the update arrived on.
    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    /// The message payload, if any.
    pub fn message(&self) -> Option<&Message> {
        self.update.message.as_ref()
    }

    /// The originating user.
    pub fn sender(&self) -> Option<&User> {
        self.update.sender()
    }

    /// Text of the message (or its caption).
    pub fn text(&self) -> Option<&str> {
        self.message().and_then(Message::plain_text)
    }

    /// Whitespace separated arguments following a leading `/command` token.
    ///
    /// Returns an empty list when the message is not a command.
    pub fn command_args(&self) -> Vec<&str> {
        match self.text() {
            Some(text) if text.starts_with('/') => text.split_whitespace().skip(1).collect(),
            _ => Vec::new(),
        }
    }

    /// Data attached to a callback query.
    pub fn callback_data(&self) -> Option<&str> {
        self.update.callback_query.as_ref()?.data.as_deref()
    }

    /// Replies with plain text into the chat the update came from.
    pub async fn reply(&self, text: &str) -> TransportResult<i64> {
        self.reply_with(text, ParseMode::Plain).await
    }

    /// Replies into the originating chat using `parse_mode`.
    pub async fn reply_with(&self, text: &str, parse_mode: ParseMode) -> TransportResult<i64> {
        let chat_id = self.reply_chat()?;
        self.transport.send_message(chat_id, text, parse_mode).await
    }

    fn reply_chat(&self) -> TransportResult<ChatId> {
        self.update
            .chat_id()
            .or_else(|| self.sender().map(|u| u.id))
            .ok_or_else(|| TransportError::Other("update has no chat to reply to".into()))
    }
}

impl std::fmt::Debug for UpdateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateContext")
            .field("update_id", &self.update.update_id)
            .finish_non_exhaustive()
    }
}
