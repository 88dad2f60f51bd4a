//! Postgres-backed stores.
//!
//! Uniqueness (email, refresh-token string) is enforced by database
//! constraints; this module just maps constraint violations onto
//! `StoreError::Conflict` so callers can retry or report them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::models::{RefreshToken, Task, User};
use crate::store::{
    AccountChanges, CredentialStore, NewTask, NewUser, StoreError, TaskChanges, TaskStore,
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx)
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let field = match db.constraint() {
                Some(c) if c.contains("email") => "email",
                Some(c) if c.contains("token") => "token",
                _ => "record",
            };
            StoreError::Conflict(field.to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => StoreError::Unavailable(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (uuid, name, email, password_digest)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_digest)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn find_user_by_uuid(&self, uuid: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn update_account(&self, id: i64, changes: AccountChanges) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or(StoreError::NotFound)
    }

    async fn update_password(&self, id: i64, password_digest: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_digest = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(password_digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or(StoreError::NotFound)
    }

    async fn create_refresh_token(
        &self,
        user_id: i64,
        token: &str,
        expiration_at: DateTime<Utc>,
    ) -> Result<RefreshToken, StoreError> {
        sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expiration_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expiration_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, StoreError> {
        sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn delete_refresh_token(&self, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_refresh_tokens_for(&self, user_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_for(&self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn find_for(&self, user_id: i64, id: i64) -> Result<Option<Task>, StoreError> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn create_for(&self, user_id: i64, task: NewTask) -> Result<Task, StoreError> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, content, checked, due_to)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&task.title)
        .bind(&task.content)
        .bind(task.checked)
        .bind(task.due_to)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn update_for(
        &self,
        user_id: i64,
        id: i64,
        changes: TaskChanges,
    ) -> Result<Task, StoreError> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($3, title),
                content = COALESCE($4, content),
                checked = COALESCE($5, checked),
                due_to = COALESCE($6, due_to),
                updated_at = NOW()
            WHERE user_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(id)
        .bind(changes.title)
        .bind(changes.content)
        .bind(changes.checked)
        .bind(changes.due_to)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_for(&self, user_id: i64, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}
