use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A user known to the service, registered from token claims on first use
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub username: String,
    pub nickname: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
