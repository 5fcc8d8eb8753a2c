//! Inbound update model.
//!
//! An [`Update`] is one event pulled from the chat transport. The shape mirrors
//! the JSON returned by long-polling chat APIs so transports can deserialize
//! pages of updates directly with `serde_json`.
//!
//! Updates are immutable once received. The dispatcher borrows them for the
//! duration of a single dispatch call.

use serde::{Deserialize, Serialize};

/// Identifier of a chat user.
pub type UserId = i64;

/// Identifier of a chat (private, group or channel).
pub type ChatId = i64;

/// A chat user as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl User {
    /// Creates a human user with the given id and first name.
    pub fn new(id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            id,
            is_bot: false,
            first_name: first_name.into(),
            username: None,
        }
    }
}

/// Kind of chat a message was posted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    #[default]
    Private,
    Group,
    Supergroup,
    Channel,
}

/// The chat a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(default, rename = "type")]
    pub kind: ChatKind,
}

/// One size variant of a photo attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: User,
    #[serde(default)]
    pub date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<PhotoSize>,
}

impl Message {
    /// Creates a private text message from `from`.
    pub fn text(message_id: i64, from: User, text: impl Into<String>) -> Self {
        Self {
            message_id,
            chat: Chat {
                id: from.id,
                kind: ChatKind::Private,
            },
            from,
            date: 0,
            text: Some(text.into()),
            caption: None,
            photo: Vec::new(),
        }
    }

    /// Returns the message text, or the caption for media messages.
    pub fn plain_text(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    /// Returns `true` if the message carries a photo.
    pub fn has_photo(&self) -> bool {
        !self.photo.is_empty()
    }
}

/// A press on an inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// One inbound event from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// Monotonically increasing identifier assigned by the transport.
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Wraps a message into an update.
    pub fn from_message(update_id: i64, message: Message) -> Self {
        Self {
            update_id,
            message: Some(message),
            callback_query: None,
        }
    }

    /// Wraps a callback query into an update.
    pub fn from_callback(update_id: i64, query: CallbackQuery) -> Self {
        Self {
            update_id,
            message: None,
            callback_query: Some(query),
        }
    }

    /// The user that originated this update.
    ///
    /// The callback-query sender takes precedence over the message sender.
    pub fn sender(&self) -> Option<&User> {
        match (&self.callback_query, &self.message) {
            (Some(query), _) => Some(&query.from),
            (None, Some(message)) => Some(&message.from),
            (None, None) => None,
        }
    }

    /// The chat to reply into, if one can be derived.
    pub fn chat_id(&self) -> Option<ChatId> {
        self.message
            .as_ref()
            .or_else(|| self.callback_query.as_ref()?.message.as_ref())
            .map(|m| m.chat.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_message_update() {
        let raw = r#"{
            "update_id": 7,
            "message": {
                "message_id": 1,
                "chat": {"id": 99, "type": "group"},
                "from": {"id": 42, "is_bot": false, "first_name": "Ann"},
                "date": 1700000000,
                "text": "/start now"
            }
        }"#;

        let update: Update = serde_json::from_str(raw).unwrap();
        assert_eq!(update.update_id, 7);
        assert_eq!(update.sender().map(|u| u.id), Some(42));
        assert_eq!(update.chat_id(), Some(99));
        let message = update.message.unwrap();
        assert_eq!(message.chat.kind, ChatKind::Group);
        assert_eq!(message.plain_text(), Some("/start now"));
    }

    #[test]
    fn test_callback_sender_takes_precedence() {
        let mut update = Update::from_message(1, Message::text(1, User::new(1, "a"), "hi"));
        update.callback_query = Some(CallbackQuery {
            id: "cb".into(),
            from: User::new(2, "b"),
            message: None,
            data: Some("vote:up".into()),
        });

        assert_eq!(update.sender().map(|u| u.id), Some(2));
    }

    #[test]
    fn test_update_without_payload_has_no_sender() {
        let update: Update = serde_json::from_str(r#"{"update_id": 3}"#).unwrap();
        assert!(update.sender().is_none());
        assert!(update.chat_id().is_none());
    }

    #[test]
    fn test_caption_used_as_plain_text() {
        let mut message = Message::text(1, User::new(1, "a"), "");
        message.text = None;
        message.caption = Some("sunset".into());
        message.photo.push(PhotoSize {
            file_id: "f".into(),
            width: 10,
            height: 10,
        });

        assert_eq!(message.plain_text(), Some("sunset"));
        assert!(message.has_photo());
    }
}
