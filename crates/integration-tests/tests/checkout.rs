//! Cart to order flow over HTTP.

use reqwest::StatusCode;
use serde_json::json;

use emporium_integration_tests::{TestServer, shipping_address};

#[tokio::test]
async fn test_two_line_checkout_totals_25() {
    let server = TestServer::start().await;
    let token = server.register("alice").await;
    let widget = server.add_product(&token, "Widget", "10.00").await;
    let gadget = server.add_product(&token, "Gadget", "5.00").await;

    server.add_to_cart(&token, widget, 2).await;
    let cart = server.add_to_cart(&token, gadget, 1).await;
    assert_eq!(cart["total"], "25.00");

    let (status, order) = server.checkout(&token).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["total"], "25.00");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["shippingAddress"], shipping_address());
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    let (_, cart) = server.get("/api/cart", Some(&token)).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["total"], "0.00");
}

#[tokio::test]
async fn test_missing_city_leaves_cart_alone() {
    let server = TestServer::start().await;
    let token = server.register("alice").await;
    let widget = server.add_product(&token, "Widget", "10.00").await;
    server.add_to_cart(&token, widget, 1).await;

    let mut address = shipping_address();
    address.as_object_mut().unwrap().remove("city");
    let (status, body) = server
        .post(
            "/api/orders/create",
            Some(&token),
            &json!({ "shippingAddress": address }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "shippingAddress.city");

    let (_, orders) = server.get("/api/orders", Some(&token)).await;
    assert!(orders.as_array().unwrap().is_empty());
    let (_, cart) = server.get("/api/cart", Some(&token)).await;
    assert_eq!(cart["items"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let server = TestServer::start().await;
    let token = server.register("alice").await;

    let (status, body) = server.checkout(&token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cart is empty");

    let (_, orders) = server.get("/api/orders", Some(&token)).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_checkouts_place_one_order() {
    let server = TestServer::start().await;
    let token = server.register("alice").await;
    let widget = server.add_product(&token, "Widget", "2.00").await;
    server.add_to_cart(&token, widget, 5).await;

    let (first, second) = tokio::join!(server.checkout(&token), server.checkout(&token));
    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);

    let (_, orders) = server.get("/api/orders", Some(&token)).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["total"], "10.00");
}

#[tokio::test]
async fn test_cart_add_is_additive() {
    let server = TestServer::start().await;
    let token = server.register("alice").await;
    let widget = server.add_product(&token, "Widget", "1.25").await;

    server.add_to_cart(&token, widget, 2).await;
    let cart = server.add_to_cart(&token, widget, 3).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 5);
    assert_eq!(cart["total"], "6.25");

    let (status, body) = server
        .post(
            "/api/cart/add",
            Some(&token),
            &json!({ "productId": widget, "quantity": 9_999 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}
