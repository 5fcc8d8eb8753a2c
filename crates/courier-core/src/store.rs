//! User store interface.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::update::UserId;

/// Role given to bot operators who receive `notify_owners` broadcasts.
pub const OWNER_ROLE: &str = "owner";

/// Selects a subset of stored users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    /// Users flagged as banned.
    Banned,
    /// Users holding the given role.
    Role(String),
}

impl UserFilter {
    /// Shorthand for [`UserFilter::Role`].
    pub fn role(role: impl Into<String>) -> Self {
        Self::Role(role.into())
    }
}

/// A persisted user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub banned: bool,
}

impl StoredUser {
    /// Returns `true` if this record matches `filter`.
    pub fn matches(&self, filter: &UserFilter) -> bool {
        match filter {
            UserFilter::Banned => self.banned,
            UserFilter::Role(role) => &self.role == role,
        }
    }
}

/// Persistent store of user records.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Returns the ids of all users matching `filter`.
    async fn list_ids(&self, filter: UserFilter) -> StoreResult<Vec<UserId>>;

    /// Returns all users matching `filter`.
    async fn list_users(&self, filter: UserFilter) -> StoreResult<Vec<StoredUser>>;
}

/// A shared user store trait object.
pub type BoxedUserStore = Arc<dyn UserStore>;
