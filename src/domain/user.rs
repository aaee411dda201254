use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Users are provisioned by the identity service; this crate only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub handle: String,
    pub display_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Friend {
    pub user: User,
    #[serde(with = "time::serde::rfc3339::option")]
    pub friends_since: Option<OffsetDateTime>,
}
