mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::Utc;
use serde_json::json;

use common::{access_token, refresh_token, register, send, test_app};
use taskdeck_api::config::SecurityConfig;

#[tokio::test]
async fn registration_returns_tokens_and_public_user() -> Result<()> {
    let app = test_app();
    let body = register(&app, "Alice", "alice@example.com", "secret-pass").await?;

    assert_eq!(body["status"], "OK");
    assert!(body["access_token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());
    assert!(body["refresh_token_exp"].as_i64().unwrap() > Utc::now().timestamp());

    // Only the opaque uuid is exposed, never the internal id.
    assert!(body["user"]["uuid"].as_str().is_some());
    assert!(body["user"].get("id").is_none());
    assert!(body["user"].get("password_digest").is_none());
    Ok(())
}

#[tokio::test]
async fn registration_collects_field_errors() -> Result<()> {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({
            "user": {
                "name": "a".repeat(101),
                "email": "example+@example.com",
                "password": "pass",
                "password_confirmation": "pass",
            }
        })),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "NG");
    assert_eq!(body["error"], "Bad Request");
    assert!(body["messages"]["name"][0].as_str().is_some());
    assert!(body["messages"]["email"][0].as_str().is_some());
    assert!(body["messages"]["password"][0].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn registration_rejects_confirmation_mismatch() -> Result<()> {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({
            "user": {
                "name": "Alice",
                "email": "alice@example.com",
                "password": "secret-pass",
                "password_confirmation": "different-pass",
            }
        })),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["messages"]["password_confirmation"][0].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_field_error() -> Result<()> {
    let app = test_app();
    register(&app, "Alice", "alice@example.com", "secret-pass").await?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({
            "user": {
                "name": "Imposter",
                "email": "alice@example.com",
                "password": "secret-pass",
                "password_confirmation": "secret-pass",
            }
        })),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["messages"]["email"][0].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn login_returns_tokens_and_rejects_bad_credentials_uniformly() -> Result<()> {
    let app = test_app();
    register(&app, "Alice", "alice@example.com", "secret-pass").await?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "secret-pass"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].as_str().is_some());

    for payload in [
        json!({"email": "alice@example.com", "password": "wrong-pass"}),
        json!({"email": "nobody@example.com", "password": "secret-pass"}),
    ] {
        let (status, body) =
            send(&app, Method::POST, "/api/v1/auth/login", None, Some(payload)).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "NG");
        assert_eq!(body["error"], "Unauthorized");
        assert!(body.get("messages").is_none());
    }
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_and_garbage_tokens() -> Result<()> {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/api/v1/tasks", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/tasks",
        Some("aaaaaaaaaaaaaaaaaaaaaaaaa"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    assert!(body.get("messages").is_none());
    Ok(())
}

#[tokio::test]
async fn expired_access_token_is_rejected_like_any_other_failure() -> Result<()> {
    // Negative access ttl: every issued access token is already expired.
    let app = common::test_app_with_security(SecurityConfig {
        jwt_secret: "integration-test-secret".to_string(),
        access_token_ttl_secs: -5,
        refresh_token_ttl_secs: 3600,
    });
    let body = register(&app, "Alice", "alice@example.com", "secret-pass").await?;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/tasks",
        Some(access_token(&body)),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    Ok(())
}

#[tokio::test]
async fn account_update_changes_name_and_email() -> Result<()> {
    let app = test_app();
    let reg = register(&app, "Alice", "alice@example.com", "secret-pass").await?;
    let token = access_token(&reg);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/account",
        Some(token),
        Some(json!({"user": {"name": "Alicia"}})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Alicia");
    assert_eq!(body["user"]["email"], "alice@example.com");

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/account",
        Some(token),
        Some(json!({"user": {"email": "not-an-email"}})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["messages"]["email"][0].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn password_change_requires_old_password_and_revokes_sessions() -> Result<()> {
    let app = test_app();
    let reg = register(&app, "Alice", "alice@example.com", "secret-pass").await?;
    let token = access_token(&reg);

    // Wrong old password is a 401, not a validation error.
    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/password",
        Some(token),
        Some(json!({"user": {
            "old_password": "wrong-pass",
            "password": "next-secret",
            "password_confirmation": "next-secret",
        }})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Confirmation mismatch is a field-keyed 400.
    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/password",
        Some(token),
        Some(json!({"user": {
            "old_password": "secret-pass",
            "password": "next-secret",
            "password_confirmation": "other-secret",
        }})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["messages"]["password_confirmation"][0].as_str().is_some());

    // Success is an empty 204.
    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/password",
        Some(token),
        Some(json!({"user": {
            "old_password": "secret-pass",
            "password": "next-secret",
            "password_confirmation": "next-secret",
        }})),
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    // The pre-change refresh token was revoked.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": refresh_token(&reg)})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The new password logs in.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "next-secret"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn refresh_rotation_is_single_use() -> Result<()> {
    let app = test_app();
    let reg = register(&app, "Alice", "alice@example.com", "secret-pass").await?;
    let old_refresh = refresh_token(&reg).to_string();

    let (status, rotated) = send(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": old_refresh})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refresh_token"], reg["refresh_token"]);
    assert!(rotated["access_token"].as_str().is_some());

    // Replaying the consumed token fails.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": old_refresh})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    // The replacement token still rotates.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": rotated["refresh_token"]})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn logout_revokes_the_refresh_token_idempotently() -> Result<()> {
    let app = test_app();
    let reg = register(&app, "Alice", "alice@example.com", "secret-pass").await?;
    let refresh = refresh_token(&reg).to_string();

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/v1/auth/logout",
        None,
        Some(json!({"refresh_token": refresh})),
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Logged-out token no longer rotates.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": refresh})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Repeating the logout is still a quiet 204.
    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/v1/auth/logout",
        None,
        Some(json!({"refresh_token": refresh})),
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn rotating_another_users_token_never_leaks_their_session() -> Result<()> {
    let app = test_app();
    let alice = register(&app, "Alice", "alice@example.com", "secret-pass").await?;
    let _mallory = register(&app, "Mallory", "mallory@example.com", "secret-pass").await?;

    // Mallory guesses at tokens; anything that is not an exact live token
    // string fails, and a failure reveals nothing about Alice.
    let mut guess = refresh_token(&alice).to_string();
    guess.pop();
    guess.push('x'); // never a hex digit, so never a live token

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": guess})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("access_token").is_none());
    Ok(())
}
