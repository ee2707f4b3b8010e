//! E2E tests for registration and verification codes.
//!
//! Tests drive a real server instance through its HTTP surface using the
//! `TestAuthServer` harness.
//!
//! ## Test Categories
//!
//! - **Verification codes**: issuance, delivery target policy, rate limiting
//! - **Registration**: proof of control, account policy, uniqueness

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use id_test_utils::TestAuthServer;
use reqwest::StatusCode;
use serde_json::json;

async fn request_code(
    server: &TestAuthServer,
    client: &reqwest::Client,
    target: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(client
        .post(format!("{}/api/v1/auth/code", server.url()))
        .json(&json!({ "target": target }))
        .send()
        .await?)
}

async fn register(
    server: &TestAuthServer,
    client: &reqwest::Client,
    username: &str,
    email: &str,
    password: &str,
    code: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(client
        .post(format!("{}/api/v1/auth/register", server.url()))
        .json(&json!({
            "username": username,
            "email": email,
            "password": password,
            "code": code,
        }))
        .send()
        .await?)
}

// ============================================================================
// Verification Code Tests
// ============================================================================

/// Requesting a code stores one for the target and returns 204. The code
/// itself never appears in the response.
#[tokio::test]
async fn test_code_request_stores_code() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    let response = request_code(&server, &client, "alice@example.com").await?;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.content_length().unwrap_or(0) == 0);

    let code = server
        .verification_code("alice@example.com")
        .await
        .expect("a code should be stored");
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    Ok(())
}

/// A target that is not a plausible email address is rejected.
#[tokio::test]
async fn test_code_request_rejects_bad_target() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    for target in ["not-an-email", "teapot@", "@nowhere", "a@b"] {
        let response = request_code(&server, &client, target).await?;

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "target {target:?} should be rejected"
        );
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["code"].as_str(), Some("INVALID_TARGET"));
    }

    Ok(())
}

/// Asking again within the resend window is rate limited.
#[tokio::test]
async fn test_code_request_rate_limited_on_resend() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    let first = request_code(&server, &client, "bob@example.com").await?;
    assert_eq!(first.status(), StatusCode::NO_CONTENT);

    let second = request_code(&server, &client, "bob@example.com").await?;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = second.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("RATE_LIMITED"));

    // A different target is unaffected
    let other = request_code(&server, &client, "carol@example.com").await?;
    assert_eq!(other.status(), StatusCode::NO_CONTENT);

    Ok(())
}

// ============================================================================
// Registration Tests
// ============================================================================

/// Happy path: with a live code, registration creates the account and the
/// user can log in.
#[tokio::test]
async fn test_register_happy_path() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    request_code(&server, &client, "alice@example.com").await?;
    let code = server
        .verification_code("alice@example.com")
        .await
        .expect("code stored");

    let response = register(&server, &client, "alice", "alice@example.com", "hunter42", &code).await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await?;
    assert!(body["subject_id"].as_u64().is_some_and(|id| id >= 1));
    assert_eq!(body["username"].as_str(), Some("alice"));
    // No credentials or tokens in the registration response
    assert!(body.get("password").is_none());
    assert!(body.get("access_token").is_none());

    let response = client
        .post(format!("{}/api/v1/auth/login", server.url()))
        .json(&json!({ "username": "alice", "password": "hunter42" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

/// A wrong code leaves no account behind.
#[tokio::test]
async fn test_register_rejects_wrong_code() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    request_code(&server, &client, "bob@example.com").await?;
    let real_code = server
        .verification_code("bob@example.com")
        .await
        .expect("code stored");
    // Any fixed guess could collide with the random code
    let wrong_code = if real_code == "000000" { "000001" } else { "000000" };

    let response =
        register(&server, &client, "bob", "bob@example.com", "hunter42", wrong_code).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("INVALID_PROOF"));

    // No account was created
    let response = client
        .post(format!("{}/api/v1/auth/login", server.url()))
        .json(&json!({ "username": "bob", "password": "hunter42" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

/// Registration without requesting a code first fails.
#[tokio::test]
async fn test_register_without_code_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    let response =
        register(&server, &client, "carol", "carol@example.com", "hunter42", "123456").await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("INVALID_PROOF"));

    Ok(())
}

/// A code is consumed by the registration that uses it.
#[tokio::test]
async fn test_register_consumes_code() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    request_code(&server, &client, "dave@example.com").await?;
    let code = server
        .verification_code("dave@example.com")
        .await
        .expect("code stored");

    let first = register(&server, &client, "dave", "dave@example.com", "hunter42", &code).await?;
    assert_eq!(first.status(), StatusCode::CREATED);

    // Same target and code, new username. Were the code still live this
    // would be a 409 on the duplicate email; a consumed proof fails first.
    let second = register(&server, &client, "dave2", "dave@example.com", "hunter42", &code).await?;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = second.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("INVALID_PROOF"));

    Ok(())
}

/// Duplicate usernames and duplicate emails are both conflicts.
#[tokio::test]
async fn test_register_duplicate_account_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    request_code(&server, &client, "erin@example.com").await?;
    let code = server
        .verification_code("erin@example.com")
        .await
        .expect("code stored");
    let response = register(&server, &client, "erin", "erin@example.com", "hunter42", &code).await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Same username, different email
    request_code(&server, &client, "erin2@example.com").await?;
    let code = server
        .verification_code("erin2@example.com")
        .await
        .expect("code stored");
    let response =
        register(&server, &client, "erin", "erin2@example.com", "hunter42", &code).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("DUPLICATE_ACCOUNT"));

    // Different username, same email
    request_code(&server, &client, "erin3@example.com").await?;
    let code = server
        .verification_code("erin3@example.com")
        .await
        .expect("code stored");
    let response = register(&server, &client, "erin3", "erin@example.com", "hunter42", &code).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    Ok(())
}

/// Passwords outside the policy are rejected before any account exists.
#[tokio::test]
async fn test_register_rejects_weak_passwords() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    // Too short, digits only, letters only, too long
    let weak = ["a1", "123456", "abcdef", "a1aaaaaaaaaaaaaaaaaaa"];

    for (i, password) in weak.iter().enumerate() {
        let email = format!("weak{i}@example.com");
        request_code(&server, &client, &email).await?;
        let code = server.verification_code(&email).await.expect("code stored");

        let response =
            register(&server, &client, &format!("weak{i}"), &email, password, &code).await?;

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "password {password:?} should be rejected"
        );
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["code"].as_str(), Some("WEAK_CREDENTIAL"));
    }

    Ok(())
}

/// Usernames that could not travel safely in a header are rejected.
#[tokio::test]
async fn test_register_rejects_bad_usernames() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    let bad = ["ab", "has space", "évariste", "x\r\ny", ".leading"];

    for (i, username) in bad.iter().enumerate() {
        let email = format!("name{i}@example.com");
        request_code(&server, &client, &email).await?;
        let code = server.verification_code(&email).await.expect("code stored");

        let response = register(&server, &client, username, &email, "hunter42", &code).await?;

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "username {username:?} should be rejected"
        );
    }

    Ok(())
}

/// Two racing registrations for the same username admit exactly one.
#[tokio::test]
async fn test_register_concurrent_same_username_single_winner() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    // Two independent codes for two distinct emails, one contested username
    request_code(&server, &client, "left@example.com").await?;
    let left_code = server
        .verification_code("left@example.com")
        .await
        .expect("code stored");
    request_code(&server, &client, "right@example.com").await?;
    let right_code = server
        .verification_code("right@example.com")
        .await
        .expect("code stored");

    let url = format!("{}/api/v1/auth/register", server.url());
    let left = tokio::spawn({
        let client = client.clone();
        let url = url.clone();
        async move {
            client
                .post(url)
                .json(&json!({
                    "username": "contested",
                    "email": "left@example.com",
                    "password": "hunter42",
                    "code": left_code,
                }))
                .send()
                .await
        }
    });
    let right = tokio::spawn({
        let client = client.clone();
        async move {
            client
                .post(url)
                .json(&json!({
                    "username": "contested",
                    "email": "right@example.com",
                    "password": "hunter42",
                    "code": right_code,
                }))
                .send()
                .await
        }
    });

    let statuses = [left.await??.status(), right.await??.status()];

    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let conflicts = statuses
        .iter()
        .filter(|s| **s == StatusCode::CONFLICT)
        .count();
    assert_eq!(created, 1, "exactly one registration should win: {statuses:?}");
    assert_eq!(conflicts, 1, "the loser should see a conflict: {statuses:?}");

    Ok(())
}
