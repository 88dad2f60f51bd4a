pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use token::{TokenError, TokenPair, TokenService};

/// Access-token claim set. `sub` is the user's external uuid; the internal
/// database id never appears in a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}
