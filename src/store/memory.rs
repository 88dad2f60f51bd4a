//! In-memory stores backing the test suite and local development.
//!
//! Semantics mirror the Postgres implementation, including the uniqueness
//! constraints on email and refresh-token strings.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{RefreshToken, Task, User};
use crate::store::{
    AccountChanges, CredentialStore, NewTask, NewUser, StoreError, TaskChanges, TaskStore,
};

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    tokens: Vec<RefreshToken>,
    tasks: Vec<Task>,
    next_user_id: i64,
    next_task_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Poisoning only happens if a test thread panicked mid-write.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email".to_string()));
        }
        inner.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_user_id,
            uuid: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_digest: user.password_digest,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_uuid(&self, uuid: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.uuid == uuid).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_account(&self, id: i64, changes: AccountChanges) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if let Some(email) = &changes.email {
            if inner.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Conflict("email".to_string()));
            }
        }
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_password(&self, id: i64, password_digest: &str) -> Result<User, StoreError> {
        let mut inner = self.lock();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.password_digest = password_digest.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn create_refresh_token(
        &self,
        user_id: i64,
        token: &str,
        expiration_at: DateTime<Utc>,
    ) -> Result<RefreshToken, StoreError> {
        let mut inner = self.lock();
        if inner.tokens.iter().any(|t| t.token == token) {
            return Err(StoreError::Conflict("token".to_string()));
        }
        let record = RefreshToken {
            token: token.to_string(),
            user_id,
            expiration_at,
            created_at: Utc::now(),
        };
        inner.tokens.push(record.clone());
        Ok(record)
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, StoreError> {
        Ok(self.lock().tokens.iter().find(|t| t.token == token).cloned())
    }

    async fn delete_refresh_token(&self, token: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let before = inner.tokens.len();
        inner.tokens.retain(|t| t.token != token);
        Ok(inner.tokens.len() < before)
    }

    async fn delete_refresh_tokens_for(&self, user_id: i64) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let before = inner.tokens.len();
        inner.tokens.retain(|t| t.user_id != user_id);
        Ok((before - inner.tokens.len()) as u64)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_for(&self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .lock()
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_for(&self, user_id: i64, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(self
            .lock()
            .tasks
            .iter()
            .find(|t| t.user_id == user_id && t.id == id)
            .cloned())
    }

    async fn create_for(&self, user_id: i64, task: NewTask) -> Result<Task, StoreError> {
        let mut inner = self.lock();
        inner.next_task_id += 1;
        let now = Utc::now();
        let task = Task {
            id: inner.next_task_id,
            user_id,
            title: task.title,
            content: task.content,
            checked: task.checked,
            due_to: task.due_to,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_for(
        &self,
        user_id: i64,
        id: i64,
        changes: TaskChanges,
    ) -> Result<Task, StoreError> {
        let mut inner = self.lock();
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| t.user_id == user_id && t.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(content) = changes.content {
            task.content = Some(content);
        }
        if let Some(checked) = changes.checked {
            task.checked = checked;
        }
        if let Some(due_to) = changes.due_to {
            task.due_to = Some(due_to);
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete_for(&self, user_id: i64, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let before = inner.tasks.len();
        inner.tasks.retain(|t| !(t.user_id == user_id && t.id == id));
        Ok(inner.tasks.len() < before)
    }
}
