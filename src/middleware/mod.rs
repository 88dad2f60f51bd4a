pub mod auth;
pub mod response;

pub use auth::{require_auth, CurrentUser};
pub use response::ApiResponse;
