use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted refresh token: opaque random string bound to one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: i64,
    pub expiration_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_at <= now
    }
}
