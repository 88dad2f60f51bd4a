//! Shared harness for HTTP-level tests.
//!
//! Builds the real router over the in-memory stores and drives it through
//! `tower::ServiceExt::oneshot`, so the full middleware and handler stack
//! runs without a database or a listening socket.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use taskdeck_api::auth::TokenService;
use taskdeck_api::config::SecurityConfig;
use taskdeck_api::state::AppState;
use taskdeck_api::store::memory::MemoryStore;

pub fn test_app() -> Router {
    test_app_with_security(SecurityConfig {
        jwt_secret: "integration-test-secret".to_string(),
        access_token_ttl_secs: 3600,
        refresh_token_ttl_secs: 60 * 60 * 24 * 14,
    })
}

pub fn test_app_with_security(security: SecurityConfig) -> Router {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        tokens: Arc::new(TokenService::new(&security).expect("token service")),
        credentials: store.clone(),
        tasks: store,
    };
    taskdeck_api::app(state)
}

/// Send a JSON request, returning status and parsed body (Null for empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, value))
}

/// Register a user and return the response body (tokens + user).
pub async fn register(app: &Router, name: &str, email: &str, password: &str) -> Result<Value> {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({
            "user": {
                "name": name,
                "email": email,
                "password": password,
                "password_confirmation": password,
            }
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "registration failed: {}", body);
    Ok(body)
}

/// Create a task for the bearer and return its JSON representation.
pub async fn create_task(
    app: &Router,
    token: &str,
    title: &str,
    content: Option<&str>,
    due_to: Option<&str>,
) -> Result<Value> {
    let mut task = json!({ "title": title });
    if let Some(content) = content {
        task["content"] = json!(content);
    }
    if let Some(due_to) = due_to {
        task["due_to"] = json!(due_to);
    }

    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/tasks",
        Some(token),
        Some(json!({ "task": task })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "task creation failed: {}", body);
    Ok(body["task"].clone())
}

pub fn access_token(registration: &Value) -> &str {
    registration["access_token"].as_str().expect("access_token")
}

pub fn refresh_token(registration: &Value) -> &str {
    registration["refresh_token"].as_str().expect("refresh_token")
}
