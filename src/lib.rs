pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;
pub mod store;
pub mod validation;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the full application router for the given state. Used by `main`
/// with the Postgres stores and by the test suite with in-memory ones.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(public_routes(state.clone()))
        .merge(protected_routes(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn public_routes(state: AppState) -> Router {
    use handlers::{sessions, users};

    Router::new()
        .route("/api/v1/users", post(users::register))
        .route("/api/v1/auth/login", post(sessions::login))
        .route("/api/v1/auth/refresh", post(sessions::refresh))
        .route("/api/v1/auth/logout", delete(sessions::logout))
        .with_state(state)
}

fn protected_routes(state: AppState) -> Router {
    use handlers::{tasks, users};

    Router::new()
        .route("/api/v1/users/account", patch(users::update_account))
        .route("/api/v1/users/password", patch(users::update_password))
        .route("/api/v1/tasks", get(tasks::index).post(tasks::create))
        .route(
            "/api/v1/tasks/:id",
            get(tasks::show).patch(tasks::update).delete(tasks::destroy),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state)
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
