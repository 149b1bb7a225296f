//! Data models for postsync
//!
//! Defines the records exchanged with the collection resource: the
//! server-assigned `Post` and the user-entered `Draft`.

use serde::{Deserialize, Serialize};

/// Server-assigned post identifier
pub type PostId = u64;

/// A post as returned by the collection resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Identifier assigned by the server
    pub id: PostId,
    /// Post title
    pub title: String,
    /// Post body content
    pub body: String,
    /// Owning user, when the server reports one
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
}

impl Post {
    /// Create a post with the given id, title and body
    pub fn new(id: PostId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            body: body.into(),
            user_id: None,
        }
    }

    /// Set the owning user
    pub fn with_user(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// A post the user has typed but not yet submitted
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub body: String,
}

impl Draft {
    /// Create a draft from a title and body
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// True when both fields are empty or whitespace-only
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.body.trim().is_empty()
    }
}
