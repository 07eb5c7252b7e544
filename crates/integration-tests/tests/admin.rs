//! Catalog management and the admin dashboard.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The API server running (cargo run -p shopfront-api)
//! - An admin account (see the crate docs)
//!
//! Run with: cargo test -p shopfront-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::json;

use shopfront_integration_tests::{TestClient, admin, create_product, registered_user};

#[tokio::test]
#[ignore = "Requires running API server, database and admin account"]
async fn test_product_crud() {
    let admin = admin().await;
    let product = create_product(&admin, 12.5).await;
    let path = format!("/products/{}", product["id"]);

    let (status, body) = TestClient::new().get(&path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["price"], 12.5);

    let (status, body) = admin
        .post(
            "/products",
            json!({"name": product["name"], "description": "Again", "price": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Product already exists");

    let (status, body) = admin
        .put(
            &path,
            json!({"name": product["name"], "description": "Updated", "price": 15}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["description"], "Updated");

    let (status, body) = admin
        .put(&path, json!({"name": "", "description": "Updated", "price": 15}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");

    let (status, _) = admin.delete(&path, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = admin.delete(&path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_users_cannot_write_catalog() {
    let (client, _) = registered_user().await;

    let (status, body) = client
        .post(
            "/products",
            json!({"name": "Sneaky", "description": "Nope", "price": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized access");

    let (status, _) = client.get("/admin").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server, database and admin account"]
async fn test_dashboard_lists_everything() {
    let admin = admin().await;
    let (status, body) = admin.get("/admin").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to admin dashboard");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["users"].is_array());
    assert!(body["products"].is_array());
    assert!(body["carts"].is_array());
}

#[tokio::test]
#[ignore = "Requires running API server, database and admin account"]
async fn test_delete_user_removes_cart() {
    let admin = admin().await;
    let product = create_product(&admin, 1.0).await;
    let (client, _) = registered_user().await;

    let (_, profile) = client.get("/profile").await;
    let user_id = profile["user"]["id"].clone();
    client.post("/cart", json!({"productId": product["id"]})).await;

    let path = format!("/users/{user_id}");
    let (status, body) = admin.get(&path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id);

    let (status, body) = admin.delete(&path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (_, body) = admin.get("/admin").await;
    let carts = body["carts"].as_array().expect("carts");
    assert!(carts.iter().all(|cart| cart["userId"] != user_id));

    let (status, body) = client.get("/cart").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
#[ignore = "Requires running API server, database and admin account"]
async fn test_admin_cannot_delete_self() {
    let admin = admin().await;
    let (_, profile) = admin.get("/profile").await;

    let path = format!("/users/{}", profile["user"]["id"]);
    let (status, _) = admin.delete(&path, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
