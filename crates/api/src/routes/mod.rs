//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness
//! GET    /health/ready                 - Readiness (store ping)
//!
//! # Auth (rate limited)
//! POST   /api/auth/register            - Create account, returns token
//! POST   /api/auth/login               - Returns token
//!
//! # Catalog
//! GET    /api/products                 - List products
//! POST   /api/products                 - Create product (auth)
//! DELETE /api/products/{id}            - Delete product (auth)
//!
//! # Cart (auth)
//! GET    /api/cart                     - Current cart (created on first use)
//! POST   /api/cart/add                 - Add units of a product
//! PUT    /api/cart/update              - Set a line's quantity
//! DELETE /api/cart/remove/{productId}  - Remove a line
//!
//! # Orders (auth)
//! GET    /api/orders                   - Order history, newest first
//! POST   /api/orders/create            - Checkout
//! GET    /api/orders/{orderId}         - One order
//!
//! # Users (auth)
//! GET    /api/users/profile            - Current user
//! PUT    /api/users/profile            - Change username/email
//! PUT    /api/users/password           - Change password
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    http::{HeaderValue, Method, Request, header},
    middleware::from_fn,
    routing::{delete, get, post, put},
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, request_id_middleware};
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error format.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections use the API error format.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `{"message": ...}` body for operations with nothing else to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Create the auth routes router.
fn auth_routes(config: &ApiConfig) -> Router<AppState> {
    let router = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));
    if config.rate_limit {
        router.layer(auth_rate_limiter(config.trust_proxy_headers))
    } else {
        router
    }
}

/// Create the `/api` router.
fn api_routes(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .merge(auth_routes(config))
        .route("/products", get(products::list).post(products::create))
        .route("/products/{id}", delete(products::delete))
        .route("/cart", get(cart::get_cart))
        .route("/cart/add", post(cart::add))
        .route("/cart/update", put(cart::update))
        .route("/cart/remove/{product_id}", delete(cart::remove))
        .route("/orders", get(orders::list))
        .route("/orders/create", post(orders::create))
        .route("/orders/{order_id}", get(orders::get_order))
        .route(
            "/users/profile",
            get(users::profile).put(users::update_profile),
        )
        .route("/users/password", put(users::change_password))
}

/// JSON 404 for paths no route matches.
async fn not_found() -> AppError {
    AppError::NotFound("Route".to_string())
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins = if config.cors_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Build the full application router.
///
/// Sentry layers are added by the binary so tests can use this router as-is.
pub fn build_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
            user_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes(state.config()))
        .fallback(not_found)
        .layer(from_fn(request_id_middleware))
        .layer(trace)
        .layer(cors_layer(state.config()))
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::extract::ConnectInfo;
    use axum::http::StatusCode;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::db::MemoryStore;

    fn app_with(config: ApiConfig) -> Router {
        build_router(AppState::new(config, Arc::new(MemoryStore::new())))
    }

    fn test_config() -> ApiConfig {
        ApiConfig::for_memory_store(SecretString::from("k3Yf9!qLm2#Zp7@wXr4$Tn8&Vb1^Hc6*"))
    }

    fn app() -> Router {
        app_with(test_config())
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(app: &Router, name: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": name,
                "email": format!("{name}@example.com"),
                "password": "hunter22",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn add_product(app: &Router, token: &str, name: &str, price: &str) -> i64 {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/products",
            Some(token),
            Some(json!({
                "name": name,
                "description": "A product used in route tests",
                "price": price,
                "stock": 10,
                "category": "Testing",
                "image": "/uploads/test.png",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["message"], "Product added successfully");
        body["product"]["id"].as_i64().unwrap()
    }

    fn address() -> Value {
        json!({
            "street": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "zipCode": "62701",
            "country": "USA",
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_token() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/cart", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].is_string());

        let (status, _) = send(&app, Method::GET, "/api/orders", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_checkout_scenario() {
        let app = app();
        let token = register(&app, "alice").await;
        let a = add_product(&app, &token, "Widget", "10.00").await;
        let b = add_product(&app, &token, "Gadget", "5.00").await;

        send(&app, Method::POST, "/api/cart/add", Some(&token), Some(json!({"productId": a, "quantity": 2}))).await;
        let (status, cart) = send(
            &app,
            Method::POST,
            "/api/cart/add",
            Some(&token),
            Some(json!({"productId": b, "quantity": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["total"], "25.00");

        let (status, order) = send(
            &app,
            Method::POST,
            "/api/orders/create",
            Some(&token),
            Some(json!({ "shippingAddress": address() })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{order}");
        assert_eq!(order["total"], "25.00");
        assert_eq!(order["status"], "pending");
        assert_eq!(order["items"][0]["price"], "10.00");

        let (_, cart) = send(&app, Method::GET, "/api/cart", Some(&token), None).await;
        assert_eq!(cart["items"].as_array().unwrap().len(), 0);

        let (status, orders) = send(&app, Method::GET, "/api/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(orders[0]["id"], order["id"]);

        let uri = format!("/api/orders/{}", order["id"]);
        let (status, fetched) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, order);
    }

    #[tokio::test]
    async fn test_missing_city_is_rejected_without_side_effects() {
        let app = app();
        let token = register(&app, "alice").await;
        let a = add_product(&app, &token, "Widget", "10.00").await;
        send(&app, Method::POST, "/api/cart/add", Some(&token), Some(json!({"productId": a}))).await;

        let mut shipping = address();
        shipping.as_object_mut().unwrap().remove("city");
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/orders/create",
            Some(&token),
            Some(json!({ "shippingAddress": shipping })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "shippingAddress.city");

        let (_, orders) = send(&app, Method::GET, "/api/orders", Some(&token), None).await;
        assert_eq!(orders.as_array().unwrap().len(), 0);
        let (_, cart) = send(&app, Method::GET, "/api/cart", Some(&token), None).await;
        assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_checkout() {
        let app = app();
        let token = register(&app, "alice").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/orders/create",
            Some(&token),
            Some(json!({ "shippingAddress": address() })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cart is empty");
    }

    #[tokio::test]
    async fn test_foreign_order_is_not_found() {
        let app = app();
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;
        let a = add_product(&app, &alice, "Widget", "1.00").await;
        send(&app, Method::POST, "/api/cart/add", Some(&alice), Some(json!({"productId": a}))).await;
        let (_, order) = send(
            &app,
            Method::POST,
            "/api/orders/create",
            Some(&alice),
            Some(json!({ "shippingAddress": address() })),
        )
        .await;

        let uri = format!("/api/orders/{}", order["id"]);
        let (status, body) = send(&app, Method::GET, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Order not found");

        let (status, _) = send(&app, Method::GET, "/api/orders/999", Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cart_edge_cases() {
        let app = app();
        let token = register(&app, "alice").await;

        let (status, _) = send(&app, Method::DELETE, "/api/cart/remove/1", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/cart/add",
            Some(&token),
            Some(json!({"productId": 12345, "quantity": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let a = add_product(&app, &token, "Widget", "2.50").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/cart/add",
            Some(&token),
            Some(json!({"productId": a, "quantity": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "quantity");

        let (status, cart) = send(
            &app,
            Method::PUT,
            "/api/cart/update",
            Some(&token),
            Some(json!({"productId": a, "quantity": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{cart}");

        send(&app, Method::POST, "/api/cart/add", Some(&token), Some(json!({"productId": a}))).await;
        let (status, cart) = send(
            &app,
            Method::PUT,
            "/api/cart/update",
            Some(&token),
            Some(json!({"productId": a, "quantity": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["items"][0]["quantity"], 3);
        assert_eq!(cart["total"], "7.50");

        let uri = format!("/api/cart/remove/{a}");
        let (status, cart) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["items"].as_array().unwrap().len(), 0);
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_bad_requests() {
        let app = app();
        let token = register(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/cart/add",
            Some(&token),
            Some(json!({"productId": "not-a-number"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let (status, _) = send(&app, Method::DELETE, "/api/cart/remove/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_product_validation_and_delete() {
        let app = app();
        let token = register(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({"name": "X", "price": -1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"price"));
        assert!(fields.contains(&"image"));

        let id = add_product(&app, &token, "Widget", "3").await;
        let (_, products) = send(&app, Method::GET, "/api/products", None, None).await;
        assert_eq!(products[0]["price"], "3.00");

        let uri = format!("/api/products/{id}");
        let (status, body) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Product deleted successfully");
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_only_catalog() {
        let config = ApiConfig {
            catalog_admin_only: true,
            ..test_config()
        };
        let app = app_with(config);
        let token = register(&app, "alice").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({
                "name": "Widget",
                "description": "Not allowed for customers",
                "price": "1.00",
                "stock": 1,
                "category": "Testing",
                "image": "/uploads/x.png",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_auth_and_profile() {
        let app = app();
        let token = register(&app, "alice").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "alice2", "email": "ALICE@example.com", "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "wrong-one"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "alice");
        assert!(body["user"].get("passwordHash").is_none());

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/users/profile",
            Some(&token),
            Some(json!({"username": "alicia"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Profile updated successfully");

        let (_, profile) = send(&app, Method::GET, "/api/users/profile", Some(&token), None).await;
        assert_eq!(profile["username"], "alicia");
        assert_eq!(profile["role"], "customer");

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/users/password",
            Some(&token),
            Some(json!({"currentPassword": "nope-nope", "newPassword": "another1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Current password is incorrect");
    }

    async fn login_from(app: &Router, forwarded_for: &str) -> StatusCode {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", forwarded_for)
            .body(Body::from(
                json!({"email": "nobody@example.com", "password": "whatever"}).to_string(),
            ))
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        app.clone().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_is_still_rate_limited() {
        let app = app_with(ApiConfig {
            rate_limit: true,
            ..test_config()
        });

        let mut statuses = Vec::new();
        for i in 1..=6 {
            statuses.push(login_from(&app, &format!("10.0.0.{i}")).await);
        }
        assert!(statuses[..5].iter().all(|s| *s == StatusCode::UNAUTHORIZED));
        assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_trusted_proxy_headers_key_the_limit() {
        let app = app_with(ApiConfig {
            rate_limit: true,
            trust_proxy_headers: true,
            ..test_config()
        });

        for _ in 0..5 {
            assert_eq!(login_from(&app, "10.0.0.1").await, StatusCode::UNAUTHORIZED);
        }
        assert_eq!(
            login_from(&app, "10.0.0.1").await,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(login_from(&app, "10.0.0.2").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let app = app();
        let request = Request::builder()
            .uri("/health")
            .header(crate::middleware::REQUEST_ID_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(crate::middleware::REQUEST_ID_HEADER).unwrap(),
            "abc-123"
        );
    }
}
