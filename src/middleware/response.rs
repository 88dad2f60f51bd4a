use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{Map, Value};

/// Success responses share the envelope `{"status": "OK", ...payload}`.
#[derive(Debug)]
pub struct ApiResponse {
    status_code: StatusCode,
    payload: Value,
}

impl ApiResponse {
    /// 200 OK with the payload merged into the envelope.
    pub fn ok(payload: Value) -> Self {
        Self {
            status_code: StatusCode::OK,
            payload,
        }
    }

    /// 201 Created.
    pub fn created(payload: Value) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            payload,
        }
    }

    /// 204 No Content; the body is empty by definition.
    pub fn no_content() -> Self {
        Self {
            status_code: StatusCode::NO_CONTENT,
            payload: Value::Null,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        if self.status_code == StatusCode::NO_CONTENT {
            return self.status_code.into_response();
        }

        let mut body = match self.payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                // Payloads are always JSON objects; anything else is a
                // programming error worth noticing in logs.
                tracing::error!("non-object response payload: {}", other);
                Map::new()
            }
        };
        body.insert("status".to_string(), Value::String("OK".to_string()));

        (self.status_code, Json(Value::Object(body))).into_response()
    }
}
