use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked { likes_count: i64 },
    AlreadyLiked,
    PostNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlikeOutcome {
    Unliked { likes_count: i64 },
    NotLiked,
    PostNotFound,
}

#[derive(Debug, Clone)]
pub enum CommentOutcome {
    Added {
        comment: Comment,
        comments_count: i64,
    },
    PostNotFound,
}
