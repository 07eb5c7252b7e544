//! Integration tests for Shopfront.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database and an admin account
//! cargo run -p shopfront-cli -- migrate
//! cargo run -p shopfront-cli -- user create -e admin@shopfront.test -n Admin -p admin-password -r admin
//!
//! # Start the API, then run the ignored tests
//! cargo run -p shopfront-api
//! cargo test -p shopfront-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_API_URL` - API base URL (default: `http://localhost:3000`)
//! - `SHOPFRONT_TEST_ADMIN_EMAIL` / `SHOPFRONT_TEST_ADMIN_PASSWORD` - Admin
//!   account used by catalog and dashboard tests
//!
//! The API rate limits `/login` and `/register`; helpers send a unique
//! `X-Forwarded-For` per account so tests don't throttle each other.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("SHOPFRONT_API_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// A fresh email address no other test uses.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@shopfront.test", Uuid::new_v4().simple())
}

/// A client IP that no other test shares.
fn unique_client_ip() -> String {
    let [a, b, c, ..] = Uuid::new_v4().into_bytes();
    format!("10.{a}.{b}.{c}")
}

/// Thin wrapper over `reqwest` that remembers the bearer token.
pub struct TestClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    client_ip: String,
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClient {
    /// Anonymous client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url(),
            token: None,
            client_ip: unique_client_ip(),
        }
    }

    /// Attach a bearer token to every following request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header("x-forwarded-for", &self.client_ip);

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request with an optional JSON body; returns status and body.
    ///
    /// # Panics
    ///
    /// Panics if the server is unreachable or the body is not JSON.
    pub async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response: Response = builder.send().await.expect("Failed to send request");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(reqwest::Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(reqwest::Method::DELETE, path, body).await
    }
}

/// Register a new `user` account and return a client signed in as it,
/// along with the account's email.
///
/// # Panics
///
/// Panics if registration fails.
pub async fn registered_user() -> (TestClient, String) {
    let email = unique_email();
    let client = TestClient::new();
    let (status, body) = client
        .post(
            "/register",
            json!({"name": "Test User", "email": email, "password": "password123"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "registration failed: {body}");
    let token = body["token"].as_str().expect("token in response").to_owned();
    (client.with_token(token), email)
}

/// Client signed in as the admin account from the environment.
///
/// # Panics
///
/// Panics if the admin login fails.
pub async fn admin() -> TestClient {
    let email = std::env::var("SHOPFRONT_TEST_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@shopfront.test".to_owned());
    let password = std::env::var("SHOPFRONT_TEST_ADMIN_PASSWORD")
        .unwrap_or_else(|_| "admin-password".to_owned());

    let client = TestClient::new();
    let (status, body) = client
        .post("/login", json!({"email": email, "password": password}))
        .await;

    assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
    let token = body["token"].as_str().expect("token in response").to_owned();
    client.with_token(token)
}

/// Create a product with a unique name as admin; returns its JSON.
///
/// # Panics
///
/// Panics if creation fails.
pub async fn create_product(admin: &TestClient, price: f64) -> Value {
    let (status, body) = admin
        .post(
            "/products",
            json!({
                "name": format!("Test Product {}", Uuid::new_v4().simple()),
                "description": "Created by integration tests",
                "price": price,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "product creation failed: {body}");
    body["product"].clone()
}
