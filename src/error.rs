// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Field-keyed validation messages, e.g. `{"title": ["can't be blank"]}`.
pub type FieldMessages = HashMap<String, Vec<String>>;

/// HTTP API error with the response envelope used across the API:
/// `{"status": "NG", "error": <status phrase>, "messages": {field: [..]}}`.
///
/// `messages` is only present for validation failures. Authentication
/// failures are deliberately uniform: expired, tampered and malformed tokens
/// all surface as the same 401 body.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest,
    Validation { messages: FieldMessages },

    // 401 Unauthorized
    Unauthorized,

    // 404 Not Found (single-resource show path only)
    NotFound,

    // 500 Internal Server Error
    Internal(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Build a validation error from field-keyed messages.
    pub fn validation(messages: FieldMessages) -> Self {
        ApiError::Validation { messages }
    }

    /// Single-field shorthand for validation errors.
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut messages = HashMap::new();
        messages.insert(field.into(), vec![message.into()]);
        ApiError::Validation { messages }
    }

    /// Convert to the JSON response body.
    pub fn to_json(&self) -> Value {
        let status = self.status_code();
        let phrase = status.canonical_reason().unwrap_or("Unknown");

        match self {
            ApiError::Validation { messages } => json!({
                "status": "NG",
                "error": phrase,
                "messages": messages,
            }),
            _ => json!({
                "status": "NG",
                "error": phrase,
            }),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest => write!(f, "bad request"),
            ApiError::Validation { messages } => write!(f, "validation failed: {:?}", messages),
            ApiError::Unauthorized => write!(f, "unauthorized"),
            ApiError::NotFound => write!(f, "not found"),
            ApiError::Internal(msg) => write!(f, "internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if let ApiError::Internal(msg) = &self {
            // Log the real cause; the client only sees the status phrase.
            tracing::error!("internal error: {}", msg);
        }
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

impl From<crate::auth::token::TokenError> for ApiError {
    fn from(err: crate::auth::token::TokenError) -> Self {
        use crate::auth::token::TokenError;
        match err {
            // All verification failures collapse to a uniform 401 so the
            // response never distinguishes tampered from expired tokens.
            TokenError::Expired
            | TokenError::InvalidSignature
            | TokenError::Malformed
            | TokenError::NotFound => {
                tracing::debug!("token rejected: {}", err);
                ApiError::Unauthorized
            }
            TokenError::Configuration(msg) => ApiError::Internal(msg),
            TokenError::Store(err) => err.into(),
        }
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        use crate::store::StoreError;
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Conflict(field) => {
                ApiError::validation_field(field, "has already been taken")
            }
            StoreError::Unavailable(msg) => {
                tracing::error!("store unavailable: {}", msg);
                ApiError::ServiceUnavailable("database temporarily unavailable".to_string())
            }
            StoreError::Query(msg) => {
                tracing::error!("store query error: {}", msg);
                ApiError::Internal("storage error".to_string())
            }
        }
    }
}
