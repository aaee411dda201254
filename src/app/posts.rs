use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::engagement::Comment;
use crate::domain::page::{Page, PageRequest};
use crate::domain::post::{OwnedPostChange, Post, PostAuthor, PostStats};
use crate::infra::db::Db;

const POST_SELECT: &str =
    "SELECT p.id, p.author_id, u.handle AS author_handle, u.display_name AS author_display_name, \
            p.text, p.image_url, p.is_deleted, p.deleted_at, p.created_at \
     FROM posts p \
     JOIN users u ON u.id = p.author_id";

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_post(
        &self,
        author_id: Uuid,
        text: String,
        image_url: Option<String>,
    ) -> Result<Post> {
        let row = sqlx::query(
            "WITH inserted_post AS ( \
                INSERT INTO posts (author_id, text, image_url) \
                VALUES ($1, $2, $3) \
                RETURNING id, author_id, text, image_url, is_deleted, deleted_at, created_at \
             ) \
             SELECT p.*, u.handle AS author_handle, u.display_name AS author_display_name \
             FROM inserted_post p \
             JOIN users u ON u.id = p.author_id",
        )
        .bind(author_id)
        .bind(text)
        .bind(image_url)
        .fetch_one(self.db.pool())
        .await?;

        Ok(post_from_row(&row, Vec::new(), Vec::new()))
    }

    /// Live post by id. Soft-deleted posts are reported as missing.
    pub async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let sql = format!("{} WHERE p.id = $1 AND p.is_deleted = false", POST_SELECT);
        let row = sqlx::query(&sql)
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn list_by_author(&self, author_id: Uuid, page: PageRequest) -> Result<Page<Post>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE author_id = $1 AND is_deleted = false",
        )
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;

        let sql = format!(
            "{} WHERE p.author_id = $1 AND p.is_deleted = false \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $2 OFFSET $3",
            POST_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(author_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.db.pool())
            .await?;

        Ok(Page::new(self.hydrate(rows).await?, total, page))
    }

    /// Live posts from any of `author_ids`, newest first.
    pub async fn list_by_authors(
        &self,
        author_ids: &[Uuid],
        page: PageRequest,
    ) -> Result<Page<Post>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE author_id = ANY($1) AND is_deleted = false",
        )
        .bind(author_ids)
        .fetch_one(self.db.pool())
        .await?;

        let sql = format!(
            "{} WHERE p.author_id = ANY($1) AND p.is_deleted = false \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $2 OFFSET $3",
            POST_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(author_ids)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.db.pool())
            .await?;

        Ok(Page::new(self.hydrate(rows).await?, total, page))
    }

    pub async fn list_deleted_by_author(
        &self,
        author_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE author_id = $1 AND is_deleted = true",
        )
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;

        let sql = format!(
            "{} WHERE p.author_id = $1 AND p.is_deleted = true \
             ORDER BY p.deleted_at DESC NULLS LAST, p.id DESC \
             LIMIT $2 OFFSET $3",
            POST_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(author_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.db.pool())
            .await?;

        Ok(Page::new(self.hydrate(rows).await?, total, page))
    }

    /// Live posts `user_id` has liked, most recent like first.
    pub async fn list_liked_by(&self, user_id: Uuid, page: PageRequest) -> Result<Page<Post>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) \
             FROM post_likes l \
             JOIN posts p ON p.id = l.post_id \
             WHERE l.user_id = $1 AND p.is_deleted = false",
        )
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        let sql = format!(
            "{} JOIN post_likes l ON l.post_id = p.id AND l.user_id = $1 \
             WHERE p.is_deleted = false \
             ORDER BY l.seq DESC \
             LIMIT $2 OFFSET $3",
            POST_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.db.pool())
            .await?;

        Ok(Page::new(self.hydrate(rows).await?, total, page))
    }

    /// The author's live posts that have at least one like.
    pub async fn list_liked_of_author(
        &self,
        author_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts p \
             WHERE p.author_id = $1 AND p.is_deleted = false \
               AND EXISTS (SELECT 1 FROM post_likes l WHERE l.post_id = p.id)",
        )
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;

        let sql = format!(
            "{} WHERE p.author_id = $1 AND p.is_deleted = false \
               AND EXISTS (SELECT 1 FROM post_likes l WHERE l.post_id = p.id) \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $2 OFFSET $3",
            POST_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(author_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.db.pool())
            .await?;

        Ok(Page::new(self.hydrate(rows).await?, total, page))
    }

    pub async fn soft_delete(&self, post_id: Uuid, user_id: Uuid) -> Result<OwnedPostChange> {
        let author_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT author_id FROM posts WHERE id = $1 AND is_deleted = false",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        match author_id {
            None => return Ok(OwnedPostChange::NotFound),
            Some(author_id) if author_id != user_id => return Ok(OwnedPostChange::NotOwner),
            Some(_) => {}
        }

        let result = sqlx::query(
            "UPDATE posts \
             SET is_deleted = true, deleted_at = now() \
             WHERE id = $1 AND author_id = $2 AND is_deleted = false",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(OwnedPostChange::NotFound);
        }

        Ok(self
            .find_any(post_id)
            .await?
            .map(OwnedPostChange::Changed)
            .unwrap_or(OwnedPostChange::NotFound))
    }

    pub async fn restore(&self, post_id: Uuid, user_id: Uuid) -> Result<OwnedPostChange> {
        let row = sqlx::query("SELECT author_id, is_deleted FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(OwnedPostChange::NotFound),
        };
        let author_id: Uuid = row.get("author_id");
        let is_deleted: bool = row.get("is_deleted");
        if author_id != user_id {
            return Ok(OwnedPostChange::NotOwner);
        }
        if !is_deleted {
            return Ok(OwnedPostChange::NotDeleted);
        }

        let result = sqlx::query(
            "UPDATE posts \
             SET is_deleted = false, deleted_at = NULL \
             WHERE id = $1 AND author_id = $2 AND is_deleted = true",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(OwnedPostChange::NotDeleted);
        }

        Ok(self
            .find_any(post_id)
            .await?
            .map(OwnedPostChange::Changed)
            .unwrap_or(OwnedPostChange::NotFound))
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<PostStats> {
        let row = sqlx::query(
            "SELECT \
                (SELECT COUNT(*) FROM posts \
                  WHERE author_id = $1 AND is_deleted = false) AS total_posts, \
                (SELECT COUNT(*) FROM posts \
                  WHERE author_id = $1 AND is_deleted = true) AS deleted_posts, \
                (SELECT COUNT(*) FROM post_likes l JOIN posts p ON p.id = l.post_id \
                  WHERE p.author_id = $1 AND p.is_deleted = false) AS likes_received, \
                (SELECT COUNT(*) FROM post_comments c JOIN posts p ON p.id = c.post_id \
                  WHERE p.author_id = $1 AND p.is_deleted = false) AS comments_received, \
                (SELECT COUNT(*) FROM post_likes l JOIN posts p ON p.id = l.post_id \
                  WHERE l.user_id = $1 AND p.is_deleted = false) AS likes_given, \
                (SELECT COUNT(*) FROM friend_requests \
                  WHERE status = 'accepted' \
                    AND (from_user_id = $1 OR to_user_id = $1)) AS friends",
        )
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PostStats {
            total_posts: row.get("total_posts"),
            deleted_posts: row.get("deleted_posts"),
            likes_received: row.get("likes_received"),
            comments_received: row.get("comments_received"),
            likes_given: row.get("likes_given"),
            friends: row.get("friends"),
        })
    }

    async fn find_any(&self, post_id: Uuid) -> Result<Option<Post>> {
        let sql = format!("{} WHERE p.id = $1", POST_SELECT);
        let row = sqlx::query(&sql)
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Attach like lists and comments to post rows, keeping row order.
    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Post>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let post_ids: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();

        let like_rows = sqlx::query(
            "SELECT post_id, user_id FROM post_likes \
             WHERE post_id = ANY($1) \
             ORDER BY seq",
        )
        .bind(&post_ids)
        .fetch_all(self.db.pool())
        .await?;

        let mut likes: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in like_rows {
            likes
                .entry(row.get("post_id"))
                .or_default()
                .push(row.get("user_id"));
        }

        let comment_rows = sqlx::query(
            "SELECT id, post_id, author_id, text, created_at FROM post_comments \
             WHERE post_id = ANY($1) \
             ORDER BY seq",
        )
        .bind(&post_ids)
        .fetch_all(self.db.pool())
        .await?;

        let mut comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            let comment = Comment {
                id: row.get("id"),
                post_id: row.get("post_id"),
                author_id: row.get("author_id"),
                text: row.get("text"),
                created_at: row.get("created_at"),
            };
            comments.entry(comment.post_id).or_default().push(comment);
        }

        let posts = rows
            .iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                post_from_row(
                    row,
                    likes.remove(&id).unwrap_or_default(),
                    comments.remove(&id).unwrap_or_default(),
                )
            })
            .collect();

        Ok(posts)
    }
}

fn post_from_row(row: &PgRow, likes: Vec<Uuid>, comments: Vec<Comment>) -> Post {
    Post {
        id: row.get("id"),
        author: PostAuthor {
            id: row.get("author_id"),
            handle: row.get("author_handle"),
            display_name: row.get("author_display_name"),
        },
        text: row.get("text"),
        image_url: row.get("image_url"),
        likes_count: likes.len(),
        likes,
        comments_count: comments.len(),
        comments,
        is_deleted: row.get("is_deleted"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
    }
}
