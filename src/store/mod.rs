//! Persistence contracts consumed by the token service and handlers.
//!
//! The HTTP layer only ever talks to these traits. Production wires in the
//! Postgres implementation; tests use the in-memory one so the full router
//! can be exercised without a database.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{RefreshToken, Task, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    /// Unique constraint violated; the payload names the offending field.
    #[error("{0} already taken")]
    Conflict(String),
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_digest: String,
}

/// Partial account update; `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub content: Option<String>,
    pub checked: bool,
    pub due_to: Option<DateTime<Utc>>,
}

/// Partial task update; `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub checked: Option<bool>,
    pub due_to: Option<DateTime<Utc>>,
}

/// User records and refresh tokens.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn find_user_by_uuid(&self, uuid: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn update_account(&self, id: i64, changes: AccountChanges) -> Result<User, StoreError>;
    async fn update_password(&self, id: i64, password_digest: &str) -> Result<User, StoreError>;

    /// Persist a refresh token. A colliding token string yields
    /// `Conflict("token")`; the caller decides whether to retry.
    async fn create_refresh_token(
        &self,
        user_id: i64,
        token: &str,
        expiration_at: DateTime<Utc>,
    ) -> Result<RefreshToken, StoreError>;

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, StoreError>;

    /// Delete a refresh token, returning whether a row was removed. This is
    /// the single atomic step rotation relies on: concurrent rotations of
    /// the same token see exactly one `true`.
    async fn delete_refresh_token(&self, token: &str) -> Result<bool, StoreError>;

    /// Revoke every refresh token a user holds (logout-everywhere, password
    /// change). Returns the number of tokens removed.
    async fn delete_refresh_tokens_for(&self, user_id: i64) -> Result<u64, StoreError>;
}

/// Tasks, always scoped by owner. There is deliberately no unscoped lookup;
/// a task that exists but belongs to someone else is indistinguishable from
/// one that does not exist.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_for(&self, user_id: i64) -> Result<Vec<Task>, StoreError>;
    async fn find_for(&self, user_id: i64, id: i64) -> Result<Option<Task>, StoreError>;
    async fn create_for(&self, user_id: i64, task: NewTask) -> Result<Task, StoreError>;
    /// `NotFound` when the id is absent or owned by another user.
    async fn update_for(
        &self,
        user_id: i64,
        id: i64,
        changes: TaskChanges,
    ) -> Result<Task, StoreError>;
    async fn delete_for(&self, user_id: i64, id: i64) -> Result<bool, StoreError>;
}
