use anyhow::{anyhow, Result};
use serde_json::Value;
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::notification::{Notification, NotificationKind};
use crate::domain::page::{Page, PageRequest};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct NotificationService {
    db: Db,
}

impl NotificationService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert a notification inside the caller's transaction.
    pub async fn record(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        actor_id: Uuid,
        kind: NotificationKind,
        post_id: Option<Uuid>,
        payload: Value,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO notifications (user_id, actor_id, notification_type, post_id, payload) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user_id)
        .bind(actor_id)
        .bind(kind.as_db())
        .bind(post_id)
        .bind(payload)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn list(&self, user_id: Uuid, page: PageRequest) -> Result<Page<Notification>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.db.pool())
                .await?;

        let rows = sqlx::query(
            "SELECT id, user_id, actor_id, notification_type, post_id, payload, read_at, created_at \
             FROM notifications \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.db.pool())
        .await?;

        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            let kind: String = row.get("notification_type");
            let kind = NotificationKind::from_db(&kind)
                .ok_or_else(|| anyhow!("unknown notification type: {}", kind))?;
            notifications.push(Notification {
                id: row.get("id"),
                user_id: row.get("user_id"),
                actor_id: row.get("actor_id"),
                kind,
                post_id: row.get("post_id"),
                payload: row.get("payload"),
                read_at: row.get("read_at"),
                created_at: row.get("created_at"),
            });
        }

        Ok(Page::new(notifications, total, page))
    }

    pub async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET read_at = now() \
             WHERE id = $1 AND user_id = $2 AND read_at IS NULL",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
