use std::sync::Arc;

use crate::auth::TokenService;
use crate::store::{CredentialStore, TaskStore};

/// Shared application state injected into every handler.
///
/// Holds the token service (built once from the startup config) and the
/// store implementations behind trait objects, so the same router runs
/// against Postgres in production and the in-memory store in tests.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub credentials: Arc<dyn CredentialStore>,
    pub tasks: Arc<dyn TaskStore>,
}
