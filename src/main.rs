use std::sync::Arc;

use taskdeck_api::auth::TokenService;
use taskdeck_api::config::AppConfig;
use taskdeck_api::state::AppState;
use taskdeck_api::store::postgres::PgStore;
use taskdeck_api::store::{CredentialStore, TaskStore};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL and the
    // TASKDECK_* variables.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdeck_api=info,tower_http=info".into()),
        )
        .init();

    // Missing or invalid configuration is fatal at startup, never a
    // per-request error.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let tokens = match TokenService::new(&config.security) {
        Ok(tokens) => Arc::new(tokens),
        Err(e) => {
            tracing::error!("token service error: {}", e);
            std::process::exit(1);
        }
    };

    let store = match PgStore::connect(&config.database_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("database connection error: {}", e);
            std::process::exit(1);
        }
    };

    let credentials: Arc<dyn CredentialStore> = store.clone();
    let tasks: Arc<dyn TaskStore> = store;

    let state = AppState {
        tokens,
        credentials,
        tasks,
    };

    let app = taskdeck_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("taskdeck API listening on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}
