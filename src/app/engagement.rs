use anyhow::Result;
use serde_json::json;
use sqlx::Row;
use uuid::Uuid;

use crate::app::notifications::NotificationService;
use crate::domain::engagement::{Comment, CommentOutcome, LikeOutcome, UnlikeOutcome};
use crate::domain::notification::NotificationKind;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct EngagementService {
    db: Db,
}

impl EngagementService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn like_post(&self, user_id: Uuid, post_id: Uuid) -> Result<LikeOutcome> {
        let author_id = match self.live_post_author(post_id).await? {
            Some(author_id) => author_id,
            None => return Ok(LikeOutcome::PostNotFound),
        };

        let already_liked: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM post_likes WHERE post_id = $1 AND user_id = $2)",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        if already_liked {
            return Ok(LikeOutcome::AlreadyLiked);
        }

        let mut tx = self.db.begin().await?;

        // The primary key catches a concurrent like that slipped past the check above.
        let inserted = sqlx::query(
            "INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(LikeOutcome::AlreadyLiked);
        }

        if author_id != user_id {
            NotificationService::record(
                &mut tx,
                author_id,
                user_id,
                NotificationKind::Like,
                Some(post_id),
                json!({ "post_id": post_id }),
            )
            .await?;
        }

        let likes_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(LikeOutcome::Liked { likes_count })
    }

    pub async fn unlike_post(&self, user_id: Uuid, post_id: Uuid) -> Result<UnlikeOutcome> {
        if self.live_post_author(post_id).await?.is_none() {
            return Ok(UnlikeOutcome::PostNotFound);
        }

        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Ok(UnlikeOutcome::NotLiked);
        }

        let likes_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
                .bind(post_id)
                .fetch_one(self.db.pool())
                .await?;

        Ok(UnlikeOutcome::Unliked { likes_count })
    }

    pub async fn comment_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        text: String,
    ) -> Result<CommentOutcome> {
        let author_id = match self.live_post_author(post_id).await? {
            Some(author_id) => author_id,
            None => return Ok(CommentOutcome::PostNotFound),
        };

        let mut tx = self.db.begin().await?;

        let row = sqlx::query(
            "INSERT INTO post_comments (post_id, author_id, text) VALUES ($1, $2, $3) \
             RETURNING id, post_id, author_id, text, created_at",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(&mut *tx)
        .await?;

        let comment = Comment {
            id: row.get("id"),
            post_id: row.get("post_id"),
            author_id: row.get("author_id"),
            text: row.get("text"),
            created_at: row.get("created_at"),
        };

        if author_id != user_id {
            NotificationService::record(
                &mut tx,
                author_id,
                user_id,
                NotificationKind::Comment,
                Some(post_id),
                json!({ "post_id": post_id, "comment_id": comment.id }),
            )
            .await?;
        }

        let comments_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM post_comments WHERE post_id = $1")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(CommentOutcome::Added {
            comment,
            comments_count,
        })
    }

    async fn live_post_author(&self, post_id: Uuid) -> Result<Option<Uuid>> {
        let author_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT author_id FROM posts WHERE id = $1 AND is_deleted = false",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(author_id)
    }
}
