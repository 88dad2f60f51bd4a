//! Task CRUD for the authenticated user.
//!
//! Every operation is owner-scoped through the store; an id that exists but
//! belongs to someone else behaves exactly like a missing one. Mutating
//! operations report that as a bare 400 (only `show` uses 404).

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::filter::{TaskFilter, TaskQuery};
use crate::middleware::{ApiResponse, CurrentUser};
use crate::state::AppState;
use crate::store::{NewTask, StoreError, TaskChanges};
use crate::validation::Validator;

/// The list endpoint returns at most one page of tasks.
const TASKS_PAGE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct TaskBody {
    pub task: TaskParams,
}

#[derive(Debug, Deserialize)]
pub struct TaskParams {
    pub title: Option<String>,
    pub content: Option<String>,
    pub checked: Option<bool>,
    pub due_to: Option<DateTime<Utc>>,
}

/// GET /api/v1/tasks
pub async fn index(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<TaskQuery>,
) -> Result<ApiResponse, ApiError> {
    let tasks = state.tasks.list_for(current.id).await?;

    let filter = TaskFilter::from_query(&query);
    let mut filtered = filter.apply(tasks, Utc::now());
    filtered.truncate(TASKS_PAGE_LIMIT);

    let tasks_json: Vec<_> = filtered.iter().map(|t| t.to_public_json()).collect();
    Ok(ApiResponse::ok(json!({ "tasks": tasks_json })))
}

/// GET /api/v1/tasks/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<ApiResponse, ApiError> {
    let task = state
        .tasks
        .find_for(current.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(ApiResponse::ok(json!({ "task": task.to_public_json() })))
}

/// POST /api/v1/tasks
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<TaskBody>,
) -> Result<ApiResponse, ApiError> {
    let params = body.task;

    let title = params.title.unwrap_or_default();
    let mut v = Validator::new();
    v.check_title(&title);
    if let Some(content) = &params.content {
        v.check_content(content);
    }
    v.finish()?;

    let task = state
        .tasks
        .create_for(
            current.id,
            NewTask {
                title,
                content: params.content,
                checked: params.checked.unwrap_or(false),
                due_to: params.due_to,
            },
        )
        .await?;

    Ok(ApiResponse::created(json!({ "task": task.to_public_json() })))
}

/// PATCH /api/v1/tasks/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<TaskBody>,
) -> Result<ApiResponse, ApiError> {
    let params = body.task;

    let mut v = Validator::new();
    if let Some(title) = &params.title {
        v.check_title(title);
    }
    if let Some(content) = &params.content {
        v.check_content(content);
    }
    v.finish()?;

    let task = state
        .tasks
        .update_for(
            current.id,
            id,
            TaskChanges {
                title: params.title,
                content: params.content,
                checked: params.checked,
                due_to: params.due_to,
            },
        )
        .await
        .map_err(not_owned_as_bad_request)?;

    Ok(ApiResponse::ok(json!({ "task": task.to_public_json() })))
}

/// DELETE /api/v1/tasks/:id
pub async fn destroy(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<ApiResponse, ApiError> {
    let removed = state.tasks.delete_for(current.id, id).await?;
    if !removed {
        return Err(ApiError::BadRequest);
    }
    Ok(ApiResponse::no_content())
}

/// Missing or unowned ids on mutating paths surface as a bare 400 with no
/// `messages`, indistinguishable from each other.
fn not_owned_as_bad_request(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::BadRequest,
        other => other.into(),
    }
}
