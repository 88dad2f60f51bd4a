//! Login, refresh-token rotation and logout.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::json;

use crate::auth::password;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/v1/auth/login
///
/// Unknown email and wrong password are the same uniform 401; the response
/// never reveals which half failed.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<ApiResponse, ApiError> {
    let user = state
        .credentials
        .find_user_by_email(&body.email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !password::verify_password(&body.password, &user.password_digest) {
        return Err(ApiError::Unauthorized);
    }

    let pair = state.tokens.issue_pair(state.credentials.as_ref(), &user).await?;

    tracing::info!(user = %user.uuid, "login");

    Ok(ApiResponse::ok(json!({
        "access_token": pair.access_token,
        "refresh_token": pair.refresh_token,
        "refresh_token_exp": pair.refresh_token_exp,
        "user": user.to_public_json(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
    #[serde(default)]
    pub refresh_token: String,
}

/// POST /api/v1/auth/refresh
///
/// Strict rotation: the presented token is consumed and a new pair minted.
/// Absent, expired and already-rotated tokens all map to the same 401.
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshBody>,
) -> Result<ApiResponse, ApiError> {
    let (user, pair) = state
        .tokens
        .rotate(state.credentials.as_ref(), &body.refresh_token)
        .await
        .map_err(|e| {
            tracing::debug!("refresh rotation rejected: {}", e);
            ApiError::from(e)
        })?;

    tracing::debug!(user = %user.uuid, "refresh token rotated");

    Ok(ApiResponse::ok(json!({
        "access_token": pair.access_token,
        "refresh_token": pair.refresh_token,
        "refresh_token_exp": pair.refresh_token_exp,
    })))
}

/// DELETE /api/v1/auth/logout
///
/// Revokes the presented refresh token. Always 204: whether the token
/// existed is not an answerable question for unauthenticated callers.
pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshBody>,
) -> Result<ApiResponse, ApiError> {
    let removed = state
        .credentials
        .delete_refresh_token(&body.refresh_token)
        .await?;
    tracing::debug!(removed, "logout");
    Ok(ApiResponse::no_content())
}
