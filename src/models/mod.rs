pub mod refresh_token;
pub mod task;
pub mod user;

pub use refresh_token::RefreshToken;
pub use task::Task;
pub use user::User;
