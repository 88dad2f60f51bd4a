//! Token service: stateless signed access tokens plus stateful rotating
//! refresh tokens.
//!
//! Access tokens are HS256 JWTs verified without any store lookup. Refresh
//! tokens are opaque random strings persisted through the credential store;
//! rotation deletes the old token before minting the new pair, so a rotated
//! token can never be replayed.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use thiserror::Error;

use crate::auth::Claims;
use crate::config::SecurityConfig;
use crate::models::{RefreshToken, User};
use crate::store::{CredentialStore, StoreError};

/// Attempts at generating a non-colliding refresh-token string before
/// giving up. With 256 bits of entropy a second attempt is already
/// extraordinary; the store's unique constraint is the final guard.
const REFRESH_GENERATION_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature invalid")]
    InvalidSignature,
    #[error("token malformed")]
    Malformed,
    #[error("refresh token not found")]
    NotFound,
    #[error("token service misconfigured: {0}")]
    Configuration(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The pair handed to clients at registration, login and rotation.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp of the refresh token's expiry.
    pub refresh_token_exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Build the service from the startup configuration. An empty signing
    /// secret is a configuration error, caught before the first request.
    pub fn new(security: &SecurityConfig) -> Result<Self, TokenError> {
        if security.jwt_secret.trim().is_empty() {
            return Err(TokenError::Configuration(
                "signing secret is empty".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(security.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(security.jwt_secret.as_bytes()),
            access_ttl: Duration::seconds(security.access_token_ttl_secs),
            refresh_ttl: Duration::seconds(security.refresh_token_ttl_secs),
        })
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Serialize the user's claims into a signed compact token.
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.uuid,
            name: user.name.clone(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Configuration(e.to_string()))
    }

    /// Check signature and expiry; expiry is strict, with no grace window.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        Ok(data.claims)
    }

    /// Generate and persist a refresh token for the user. A collision on
    /// the random string is treated as a generation failure and retried.
    pub async fn issue_refresh_token(
        &self,
        store: &dyn CredentialStore,
        user: &User,
    ) -> Result<RefreshToken, TokenError> {
        let expiration_at = Utc::now() + self.refresh_ttl;

        for _ in 0..REFRESH_GENERATION_ATTEMPTS {
            let token = generate_token_string();
            match store.create_refresh_token(user.id, &token, expiration_at).await {
                Ok(record) => return Ok(record),
                Err(StoreError::Conflict(_)) => continue,
                Err(other) => return Err(other.into()),
            }
        }

        Err(TokenError::Configuration(
            "refresh token generation kept colliding".to_string(),
        ))
    }

    /// Issue a fresh access + refresh pair for the user.
    pub async fn issue_pair(
        &self,
        store: &dyn CredentialStore,
        user: &User,
    ) -> Result<TokenPair, TokenError> {
        let access_token = self.issue_access_token(user)?;
        let refresh = self.issue_refresh_token(store, user).await?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh.token,
            refresh_token_exp: refresh.expiration_at.timestamp(),
        })
    }

    /// Rotate a refresh token: look it up, invalidate it, mint a new pair
    /// for the owning user.
    ///
    /// The delete is the race arbiter. Two concurrent rotations of the same
    /// token both pass the lookup, but only one delete removes a row; the
    /// loser gets `NotFound` instead of a second valid pair.
    pub async fn rotate(
        &self,
        store: &dyn CredentialStore,
        old_token: &str,
    ) -> Result<(User, TokenPair), TokenError> {
        let record = store
            .find_refresh_token(old_token)
            .await?
            .ok_or(TokenError::NotFound)?;

        if record.is_expired(Utc::now()) {
            // Expired tokens are inert; removing them here is just tidy-up.
            let _ = store.delete_refresh_token(old_token).await;
            return Err(TokenError::Expired);
        }

        if !store.delete_refresh_token(old_token).await? {
            return Err(TokenError::NotFound);
        }

        let user = store
            .find_user_by_id(record.user_id)
            .await?
            .ok_or(TokenError::NotFound)?;

        let pair = self.issue_pair(store, &user).await?;
        Ok((user, pair))
    }
}

/// 32 random bytes, hex encoded: 256 bits of entropy per token.
fn generate_token_string() -> String {
    use std::fmt::Write;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);

    let mut out = String::with_capacity(64);
    for byte in bytes {
        write!(out, "{:02x}", byte).expect("writing to String cannot fail");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::NewUser;
    use uuid::Uuid;

    fn security(access_ttl_secs: i64) -> SecurityConfig {
        SecurityConfig {
            jwt_secret: "test-secret".to_string(),
            access_token_ttl_secs: access_ttl_secs,
            refresh_token_ttl_secs: 60 * 60 * 24 * 14,
        }
    }

    fn user() -> User {
        let now = Utc::now();
        User {
            id: 1,
            uuid: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_digest: "digest".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        let err = TokenService::new(&SecurityConfig {
            jwt_secret: "  ".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 3600,
        })
        .err()
        .unwrap();
        assert!(matches!(err, TokenError::Configuration(_)));
    }

    #[test]
    fn access_token_round_trips_claims() {
        let service = TokenService::new(&security(3600)).unwrap();
        let user = user();

        let token = service.issue_access_token(&user).unwrap();
        let claims = service.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.uuid);
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn expired_access_token_is_rejected_strictly() {
        // Negative ttl puts exp in the past; leeway is zero so this must
        // fail immediately, not after a grace window.
        let service = TokenService::new(&security(-5)).unwrap();
        let token = service.issue_access_token(&user()).unwrap();

        let err = service.verify_access_token(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn tampering_with_any_segment_invalidates_the_token() {
        let service = TokenService::new(&security(3600)).unwrap();
        let token = service.issue_access_token(&user()).unwrap();

        // Flip one character in each of the three segments.
        for segment in 0..3 {
            let mut parts: Vec<String> =
                token.split('.').map(|s| s.to_string()).collect();
            assert_eq!(parts.len(), 3, "JWT must be three-part");

            let original = parts[segment].clone();
            let mut chars: Vec<char> = original.chars().collect();
            chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
            parts[segment] = chars.into_iter().collect();
            if parts[segment] == original {
                continue;
            }

            let tampered = parts.join(".");
            assert!(
                service.verify_access_token(&tampered).is_err(),
                "tampered segment {} must not verify",
                segment
            );
        }
    }

    #[test]
    fn token_from_a_different_secret_fails_verification() {
        let issuer = TokenService::new(&security(3600)).unwrap();
        let other = TokenService::new(&SecurityConfig {
            jwt_secret: "other-secret".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 3600,
        })
        .unwrap();

        let token = issuer.issue_access_token(&user()).unwrap();
        let err = other.verify_access_token(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_token_is_malformed_not_a_panic() {
        let service = TokenService::new(&security(3600)).unwrap();
        let err = service.verify_access_token("aaaaaaaaaaaaaaaaaaaaaaaaa").unwrap_err();
        assert!(matches!(err, TokenError::Malformed));
    }

    #[tokio::test]
    async fn rotation_succeeds_at_most_once_per_token() {
        let service = TokenService::new(&security(3600)).unwrap();
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                password_digest: "digest".to_string(),
            })
            .await
            .unwrap();

        let pair = service.issue_pair(&store, &user).await.unwrap();

        let (rotated_user, new_pair) =
            service.rotate(&store, &pair.refresh_token).await.unwrap();
        assert_eq!(rotated_user.id, user.id);
        assert_ne!(new_pair.refresh_token, pair.refresh_token);

        // Replay of the consumed token must fail.
        let err = service.rotate(&store, &pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, TokenError::NotFound));

        // The replacement still works.
        assert!(service.rotate(&store, &new_pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn expired_refresh_token_cannot_rotate() {
        let service = TokenService::new(&SecurityConfig {
            jwt_secret: "test-secret".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: -10,
        })
        .unwrap();
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                name: "Bob".to_string(),
                email: "bob@example.com".to_string(),
                password_digest: "digest".to_string(),
            })
            .await
            .unwrap();

        let pair = service.issue_pair(&store, &user).await.unwrap();
        let err = service.rotate(&store, &pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[tokio::test]
    async fn unknown_refresh_token_is_not_found() {
        let service = TokenService::new(&security(3600)).unwrap();
        let store = MemoryStore::new();
        let err = service.rotate(&store, "no-such-token").await.unwrap_err();
        assert!(matches!(err, TokenError::NotFound));
    }
}
