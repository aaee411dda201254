use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::engagement::Comment;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostAuthor {
    pub id: Uuid,
    pub handle: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author: PostAuthor,
    pub text: String,
    pub image_url: Option<String>,
    /// Likers in the order they liked the post. A user appears at most once.
    pub likes: Vec<Uuid>,
    pub likes_count: usize,
    /// Append-only, oldest first.
    pub comments: Vec<Comment>,
    pub comments_count: usize,
    pub is_deleted: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Result of an owner-only soft delete or restore.
#[derive(Debug, Clone)]
pub enum OwnedPostChange {
    Changed(Post),
    NotFound,
    NotOwner,
    /// Restore was asked for a post that is still live.
    NotDeleted,
}

/// Aggregate counters shown on the caller's overview.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostStats {
    pub total_posts: i64,
    pub deleted_posts: i64,
    pub likes_received: i64,
    pub comments_received: i64,
    pub likes_given: i64,
    pub friends: i64,
}
