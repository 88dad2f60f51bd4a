//! User registration and account management.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::auth::password;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, CurrentUser};
use crate::state::AppState;
use crate::store::{AccountChanges, NewUser};
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub user: RegisterParams,
}

#[derive(Debug, Deserialize)]
pub struct RegisterParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

/// POST /api/v1/users
///
/// Registers a user and immediately issues a token pair, so a fresh signup
/// is also a live session. 201 on success; field-keyed 400 on validation
/// failure (a duplicate email reports like any other field error).
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<ApiResponse, ApiError> {
    let params = body.user;

    let mut v = Validator::new();
    v.check_name(&params.name);
    v.check_email(&params.email);
    v.check_password(&params.password, &params.password_confirmation);
    v.finish()?;

    let password_digest = password::hash_password(&params.password)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = state
        .credentials
        .create_user(NewUser {
            name: params.name,
            email: params.email,
            password_digest,
        })
        .await?;

    let pair = state.tokens.issue_pair(state.credentials.as_ref(), &user).await?;

    tracing::info!(user = %user.uuid, "user registered");

    Ok(ApiResponse::created(json!({
        "access_token": pair.access_token,
        "refresh_token": pair.refresh_token,
        "refresh_token_exp": pair.refresh_token_exp,
        "user": user.to_public_json(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct AccountBody {
    pub user: AccountParams,
}

#[derive(Debug, Deserialize)]
pub struct AccountParams {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// PATCH /api/v1/users/account
///
/// Updates name and/or email for the authenticated user. Only the provided
/// fields are validated and changed.
pub async fn update_account(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<AccountBody>,
) -> Result<ApiResponse, ApiError> {
    let params = body.user;

    if params.name.is_none() && params.email.is_none() {
        return Err(ApiError::BadRequest);
    }

    let mut v = Validator::new();
    if let Some(name) = &params.name {
        v.check_name(name);
    }
    if let Some(email) = &params.email {
        v.check_email(email);
    }
    v.finish()?;

    let user = state
        .credentials
        .update_account(
            current.id,
            AccountChanges {
                name: params.name,
                email: params.email,
            },
        )
        .await?;

    Ok(ApiResponse::ok(json!({ "user": user.to_public_json() })))
}

#[derive(Debug, Deserialize)]
pub struct PasswordBody {
    pub user: PasswordParams,
}

#[derive(Debug, Deserialize)]
pub struct PasswordParams {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

/// PATCH /api/v1/users/password
///
/// Requires the current password (wrong one is a 401, not a validation
/// error). On success every refresh token the user holds is revoked: a
/// password change terminates all other sessions.
pub async fn update_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<PasswordBody>,
) -> Result<ApiResponse, ApiError> {
    let params = body.user;

    let user = state
        .credentials
        .find_user_by_id(current.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !password::verify_password(&params.old_password, &user.password_digest) {
        return Err(ApiError::Unauthorized);
    }

    let mut v = Validator::new();
    v.check_password(&params.password, &params.password_confirmation);
    v.finish()?;

    let password_digest = password::hash_password(&params.password)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    state
        .credentials
        .update_password(current.id, &password_digest)
        .await?;

    let revoked = state
        .credentials
        .delete_refresh_tokens_for(current.id)
        .await?;
    tracing::info!(user = %current.uuid, revoked, "password changed, sessions revoked");

    Ok(ApiResponse::no_content())
}
