//! Registration, login and profile flows.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The API server running (cargo run -p shopfront-api)
//!
//! Run with: cargo test -p shopfront-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::json;

use shopfront_integration_tests::{TestClient, registered_user, unique_email};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_register_returns_token_and_user() {
    let email = unique_email();
    let (status, body) = TestClient::new()
        .post(
            "/register",
            json!({"name": "  Jane Doe ", "email": email, "password": "password123"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Successfully registered");
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["name"], "Jane Doe");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_register_validation_errors() {
    let (status, body) = TestClient::new()
        .post(
            "/register",
            json!({"name": "Al", "email": "not-an-email", "password": "short"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation error");
    assert_eq!(body["errors"]["name"], "Name must be at least 3 characters long");
    assert_eq!(body["errors"]["email"], "Invalid email format");
    assert_eq!(
        body["errors"]["password"],
        "Password must be at least 8 characters long"
    );
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_registration() {
    let (_, email) = registered_user().await;

    let (status, body) = TestClient::new()
        .post(
            "/register",
            json!({"name": "Someone Else", "email": email, "password": "password123"}),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Already registered");
    assert_eq!(body["errors"]["email"], "Email already registered");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_email_case_is_one_account() {
    let (_, email) = registered_user().await;
    let shouted = email.to_uppercase();

    let (status, _) = TestClient::new()
        .post(
            "/register",
            json!({"name": "Someone Else", "email": shouted, "password": "password123"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = TestClient::new()
        .post("/login", json!({"email": shouted, "password": "password123"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], email);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_password_whitespace_is_kept() {
    let email = unique_email();
    let client = TestClient::new();
    let (status, _) = client
        .post(
            "/register",
            json!({"name": "Spacey", "email": email, "password": "  padded secret  "}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = client
        .post("/login", json!({"email": email, "password": "padded secret"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = client
        .post("/login", json!({"email": email, "password": "  padded secret  "}))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_login_errors_name_the_field() {
    let (_, email) = registered_user().await;
    let client = TestClient::new();

    let (status, body) = client
        .post("/login", json!({"email": unique_email(), "password": "password123"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errors"]["email"], "Email is not registered");

    let (status, body) = client
        .post("/login", json!({"email": email, "password": "wrong-password"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errors"]["password"], "Password is incorrect");

    let (status, body) = client
        .post("/login", json!({"email": email, "password": "password123"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully logged in");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_requires_token() {
    let (status, body) = TestClient::new().get("/profile").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token missing");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_updates() {
    let (client, _) = registered_user().await;

    let (status, body) = client.get("/profile").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to user dashboard");

    let new_email = unique_email();
    let (status, body) = client
        .put(
            "/profile/credentials",
            json!({"name": "Renamed User", "email": new_email}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Renamed User");
    assert_eq!(body["user"]["email"], new_email);

    let (status, body) = client
        .put(
            "/profile/password",
            json!({"currentPassword": "wrong-password", "newPassword": "new-password-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["currentPassword"], "Current password is incorrect");

    let (status, body) = client
        .put(
            "/profile/password",
            json!({"currentPassword": "password123", "newPassword": "new-password-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password updated successfully");

    let (status, _) = TestClient::new()
        .post("/login", json!({"email": new_email, "password": "new-password-1"}))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_avatar_must_come_from_catalog() {
    let (client, _) = registered_user().await;

    let (status, body) = client
        .put("/profile/avatar", json!({"avatar": "../secrets.png"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["avatar"], "Avatar is not available");

    let (status, body) = client.get("/avatars").await;
    assert_eq!(status, StatusCode::OK);
    let Some(first) = body["avatars"].get(0).and_then(|a| a.as_str()) else {
        return;
    };

    let (status, body) = client.put("/profile/avatar", json!({"avatar": first})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["avatar"], first);
}
