use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered user.
///
/// `id` is the internal primary key and never leaves the process; clients
/// only ever see the opaque `uuid`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public JSON representation: external uuid only, no digest.
    pub fn to_public_json(&self) -> Value {
        json!({
            "uuid": self.uuid,
            "name": self.name,
            "email": self.email,
        })
    }
}
