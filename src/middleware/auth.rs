//! Bearer-token authentication middleware.
//!
//! Per request: extract the bearer token, verify it, resolve the claims to
//! a live user, attach the user to the request. Every failure along that
//! path is the same uniform 401; the reason is logged, never surfaced.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::User;
use crate::state::AppState;

/// The authenticated principal, attached as a request extension for
/// downstream handlers.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            uuid: user.uuid,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or(ApiError::Unauthorized)?;

    let claims = state.tokens.verify_access_token(&token).map_err(|e| {
        tracing::debug!("access token rejected: {}", e);
        ApiError::Unauthorized
    })?;

    // The subject must still resolve to a live user; a token outliving its
    // account is worthless.
    let user = state
        .credentials
        .find_user_by_uuid(claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    request.extensions_mut().insert(CurrentUser::from(&user));
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
