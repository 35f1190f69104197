//! Catalog management and the admin-only policy.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use emporium_api::config::ApiConfig;
use emporium_api::db::MemoryStore;
use emporium_api::services::auth::{RegisterInput, create_account};
use emporium_core::Role;
use emporium_integration_tests::{TestServer, test_config};

#[tokio::test]
async fn test_catalog_is_public_to_read() {
    let server = TestServer::start().await;
    let token = server.register("alice").await;
    server.add_product(&token, "Widget", "9.5").await;

    let (status, products) = server.get("/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products[0]["name"], "Widget");
    assert_eq!(products[0]["price"], "9.50");
}

#[tokio::test]
async fn test_deleting_a_product_drops_it_from_carts() {
    let server = TestServer::start().await;
    let token = server.register("alice").await;
    let widget = server.add_product(&token, "Widget", "1.00").await;
    let gadget = server.add_product(&token, "Gadget", "2.00").await;
    server.add_to_cart(&token, widget, 1).await;
    server.add_to_cart(&token, gadget, 1).await;

    let (status, body) = server
        .delete(&format!("/api/products/{widget}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted successfully");

    let (_, cart) = server.get("/api/cart", Some(&token)).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["total"], "2.00");
}

#[tokio::test]
async fn test_invalid_product_reports_every_field() {
    let server = TestServer::start().await;
    let token = server.register("alice").await;

    let (status, body) = server
        .post("/api/products", Some(&token), &json!({ "price": "abc" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = server
        .post(
            "/api/products",
            Some(&token),
            &json!({ "name": "W", "description": "short", "stock": -1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().unwrap();
    for field in ["name", "description", "price", "stock", "category", "image"] {
        assert!(
            errors.iter().any(|e| e["field"] == field),
            "missing error for {field}: {body}"
        );
    }
}

#[tokio::test]
async fn test_admin_only_catalog() {
    let config = ApiConfig {
        catalog_admin_only: true,
        ..test_config()
    };
    let server = TestServer::start_with(config, Arc::new(MemoryStore::new())).await;

    create_account(
        server.store(),
        &RegisterInput {
            username: Some("boss".to_string()),
            email: Some("boss@example.com".to_string()),
            password: Some("hunter22".to_string()),
        },
        Role::Admin,
    )
    .await
    .unwrap();
    let (_, login) = server
        .post(
            "/api/auth/login",
            None,
            &json!({ "email": "boss@example.com", "password": "hunter22" }),
        )
        .await;
    let admin = login["token"].as_str().unwrap().to_string();
    let customer = server.register("alice").await;

    let product = json!({
        "name": "Widget",
        "description": "Only admins may add this",
        "price": "1.00",
        "stock": 1,
        "category": "Testing",
        "image": "/uploads/w.png",
    });
    let (status, _) = server.post("/api/products", Some(&customer), &product).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let id = server.add_product(&admin, "Widget", "1.00").await;
    let (status, _) = server
        .delete(&format!("/api/products/{id}"), Some(&customer))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = server
        .delete(&format!("/api/products/{id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
}
