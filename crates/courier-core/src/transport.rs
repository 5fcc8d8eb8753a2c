//! Chat transport interface.
//!
//! The transport is the client of the upstream messaging API. The dispatch core
//! only needs two operations from it: pulling a page of updates and sending a
//! text message.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportResult;
use crate::update::{ChatId, Update};

/// Formatting applied to outgoing message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Plain,
    Markdown,
    Html,
}

/// Client for the upstream chat API.
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    /// Fetches the updates with an id of at least `offset`.
    ///
    /// `offset` is `None` on the very first poll. Implementations may block up
    /// to `timeout` waiting for new updates (long polling). Updates must be
    /// returned in ascending `update_id` order.
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> TransportResult<Vec<Update>>;

    /// Sends `text` to `chat_id`, returning the id of the sent message.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: ParseMode,
    ) -> TransportResult<i64>;
}

/// A shared transport trait object.
pub type BoxedTransport = Arc<dyn ChatTransport>;
