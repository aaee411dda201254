use anyhow::{anyhow, Result};
use serde_json::json;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::app::notifications::NotificationService;
use crate::domain::friendship::{
    FriendEdge, FriendRequest, FriendRequestStatus, SendRequestOutcome,
};
use crate::domain::notification::NotificationKind;
use crate::domain::user::{Friend, User};
use crate::infra::db::Db;

const REQUEST_COLUMNS: &str =
    "id, from_user_id, to_user_id, status::text AS status, created_at, responded_at";

#[derive(Clone)]
pub struct FriendService {
    db: Db,
}

impl FriendService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn send_request(&self, from_user_id: Uuid, to_user_id: Uuid) -> Result<SendRequestOutcome> {
        let user_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(to_user_id)
                .fetch_one(self.db.pool())
                .await?;

        if !user_exists {
            return Ok(SendRequestOutcome::UserNotFound);
        }

        let mut tx = self.db.begin().await?;

        let existing: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM friend_requests \
                WHERE status IN ('pending', 'accepted') \
                  AND ((from_user_id = $1 AND to_user_id = $2) \
                    OR (from_user_id = $2 AND to_user_id = $1)) \
             )",
        )
        .bind(from_user_id)
        .bind(to_user_id)
        .fetch_one(&mut *tx)
        .await?;

        if existing {
            tx.rollback().await?;
            return Ok(SendRequestOutcome::AlreadyExists);
        }

        let sql = format!(
            "INSERT INTO friend_requests (from_user_id, to_user_id) VALUES ($1, $2) \
             RETURNING {}",
            REQUEST_COLUMNS
        );
        // A concurrent request for the same pair can pass the check above; the
        // open-pair unique index rejects the second insert.
        let row = match sqlx::query(&sql)
            .bind(from_user_id)
            .bind(to_user_id)
            .fetch_one(&mut *tx)
            .await
        {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => {
                tx.rollback().await?;
                return Ok(SendRequestOutcome::AlreadyExists);
            }
            Err(err) => return Err(err.into()),
        };
        let request = request_from_row(&row)?;

        NotificationService::record(
            &mut tx,
            to_user_id,
            from_user_id,
            NotificationKind::FriendRequest,
            None,
            json!({ "request_id": request.id }),
        )
        .await?;

        tx.commit().await?;

        Ok(SendRequestOutcome::Sent(request))
    }

    /// Accept or reject a pending request addressed to `user_id`.
    pub async fn respond(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        status: FriendRequestStatus,
    ) -> Result<Option<FriendRequest>> {
        let sql = format!(
            "UPDATE friend_requests \
             SET status = $3::friend_request_status, responded_at = now() \
             WHERE id = $1 AND to_user_id = $2 AND status = 'pending' \
             RETURNING {}",
            REQUEST_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(request_id)
            .bind(user_id)
            .bind(status.as_db())
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(request_from_row).transpose()
    }

    pub async fn list_incoming_pending(&self, user_id: Uuid) -> Result<Vec<FriendRequest>> {
        let sql = format!(
            "SELECT {} FROM friend_requests \
             WHERE to_user_id = $1 AND status = 'pending' \
             ORDER BY created_at DESC, id DESC",
            REQUEST_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(request_from_row).collect()
    }

    pub async fn list_friends(&self, user_id: Uuid) -> Result<Vec<Friend>> {
        let rows = sqlx::query(
            "SELECT u.id, u.handle, u.display_name, u.created_at, f.responded_at AS friends_since \
             FROM friend_requests f \
             JOIN users u ON u.id = CASE WHEN f.from_user_id = $1 THEN f.to_user_id ELSE f.from_user_id END \
             WHERE f.status = 'accepted' \
               AND (f.from_user_id = $1 OR f.to_user_id = $1) \
             ORDER BY f.responded_at DESC NULLS LAST, u.id",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut friends = Vec::with_capacity(rows.len());
        for row in rows {
            friends.push(Friend {
                user: User {
                    id: row.get("id"),
                    handle: row.get("handle"),
                    display_name: row.get("display_name"),
                    created_at: row.get("created_at"),
                },
                friends_since: row.get("friends_since"),
            });
        }

        Ok(friends)
    }

    /// Accepted friendships with either side in `user_ids`.
    pub async fn accepted_edges(&self, user_ids: &[Uuid]) -> Result<Vec<FriendEdge>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT from_user_id, to_user_id FROM friend_requests \
             WHERE status = 'accepted' \
               AND (from_user_id = ANY($1) OR to_user_id = ANY($1))",
        )
        .bind(user_ids)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| FriendEdge::new(row.get("from_user_id"), row.get("to_user_id")))
            .collect())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

fn request_from_row(row: &PgRow) -> Result<FriendRequest> {
    let status: String = row.get("status");
    let status = FriendRequestStatus::from_db(&status)
        .ok_or_else(|| anyhow!("unknown friend request status: {}", status))?;

    Ok(FriendRequest {
        id: row.get("id"),
        from_user_id: row.get("from_user_id"),
        to_user_id: row.get("to_user_id"),
        status,
        created_at: row.get("created_at"),
        responded_at: row.get("responded_at"),
    })
}
