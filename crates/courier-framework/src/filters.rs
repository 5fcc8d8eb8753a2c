//! Message filters for [`MessageHandler`](crate::MessageHandler).
//!
//! A filter is a predicate over a [`Message`]. Filters compose with [`all`],
//! [`any`] and [`not`], and any `Fn(&Message) -> bool` closure can be turned
//! into one with [`custom`].
//!
//! ```rust,ignore
//! use courier_framework::filters;
//!
//! let greeting = filters::all([
//!     filters::text(),
//!     filters::text_in(["hola", "hi", "hey"]),
//! ]);
//! ```

use std::sync::Arc;

use crate::handler::parse_command;
use courier_core::{ChatKind, Message, UserId};

/// A shared message predicate.
pub type Filter = Arc<dyn Fn(&Message) -> bool + Send + Sync>;

/// Wraps a closure into a [`Filter`].
pub fn custom<F>(f: F) -> Filter
where
    F: Fn(&Message) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Matches messages with non-empty text that is not a command.
pub fn text() -> Filter {
    custom(|m| {
        m.text
            .as_deref()
            .is_some_and(|t| !t.is_empty() && parse_command(t).is_none())
    })
}

/// Matches `/command` messages.
pub fn command() -> Filter {
    custom(|m| m.text.as_deref().and_then(parse_command).is_some())
}

/// Matches messages carrying a photo.
pub fn photo() -> Filter {
    custom(Message::has_photo)
}

/// Matches messages whose trimmed text equals one of `words`, ignoring case.
pub fn text_in<I, S>(words: I) -> Filter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let words: Vec<String> = words
        .into_iter()
        .map(|w| w.into().to_lowercase())
        .collect();
    custom(move |m| {
        m.text
            .as_deref()
            .is_some_and(|t| words.contains(&t.trim().to_lowercase()))
    })
}

/// Matches messages sent in a private chat.
pub fn private() -> Filter {
    custom(|m| m.chat.kind == ChatKind::Private)
}

/// Matches messages sent in a group or supergroup.
pub fn group() -> Filter {
    custom(|m| matches!(m.chat.kind, ChatKind::Group | ChatKind::Supergroup))
}

/// Matches messages from one of `ids`.
pub fn from_users(ids: impl IntoIterator<Item = UserId>) -> Filter {
    let ids: Vec<UserId> = ids.into_iter().collect();
    custom(move |m| ids.contains(&m.from.id))
}

/// Matches when every filter matches.
pub fn all(filters: impl IntoIterator<Item = Filter>) -> Filter {
    let filters: Vec<Filter> = filters.into_iter().collect();
    custom(move |m| filters.iter().all(|f| f(m)))
}

/// Matches when at least one filter matches.
pub fn any(filters: impl IntoIterator<Item = Filter>) -> Filter {
    let filters: Vec<Filter> = filters.into_iter().collect();
    custom(move |m| filters.iter().any(|f| f(m)))
}

/// Inverts a filter.
pub fn not(filter: Filter) -> Filter {
    custom(move |m| !filter(m))
}
