//! End-to-end tests for the Emporium API.
//!
//! Each test spawns the real router on an ephemeral port and talks to it
//! over HTTP with `reqwest`, exactly as a client would.
//!
//! # Running Tests
//!
//! ```bash
//! # Memory store only
//! cargo test -p emporium-integration-tests
//!
//! # Also exercise PostgreSQL (the database is migrated first)
//! TEST_DATABASE_URL=postgres://localhost/emporium_test cargo test -p emporium-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use emporium_api::config::ApiConfig;
use emporium_api::db::{MemoryStore, Store};
use emporium_api::routes::build_router;
use emporium_api::state::AppState;

/// Signing secret used by every test server.
pub const TEST_JWT_SECRET: &str = "k3Yf9!qLm2#Zp7@wXr4$Tn8&Vb1^Hc6*";

/// Configuration for a test server: memory store, no rate limiting.
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig::for_memory_store(SecretString::from(TEST_JWT_SECRET))
}

/// A running API server bound to `127.0.0.1` on a random port.
///
/// The server task is aborted when this is dropped.
pub struct TestServer {
    base_url: String,
    client: Client,
    store: Arc<dyn Store>,
    handle: JoinHandle<()>,
}

/// Status and decoded JSON body of a response. Non-JSON bodies decode to
/// `Value::Null`.
pub type Reply = (StatusCode, Value);

impl TestServer {
    /// Start a server with a fresh memory store and the default test config.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        Self::start_with(test_config(), Arc::new(MemoryStore::new())).await
    }

    /// Start a server with the given config and store.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start_with(config: ApiConfig, store: Arc<dyn Store>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let app = build_router(AppState::new(config, Arc::clone(&store)));
        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
            store,
            handle,
        }
    }

    /// The store behind the server, for arranging state directly.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request, optionally authenticated and with a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Reply {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.expect("Request failed");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// `GET` with a bearer token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> Reply {
        self.send(Method::GET, path, token, None).await
    }

    /// `POST` a JSON body.
    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> Reply {
        self.send(Method::POST, path, token, Some(body)).await
    }

    /// `PUT` a JSON body.
    pub async fn put(&self, path: &str, token: Option<&str>, body: &Value) -> Reply {
        self.send(Method::PUT, path, token, Some(body)).await
    }

    /// `DELETE` with a bearer token.
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Reply {
        self.send(Method::DELETE, path, token, None).await
    }

    /// Register `username` (`{username}@example.com`, password `hunter22`)
    /// and return the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if registration does not succeed.
    pub async fn register(&self, username: &str) -> String {
        let body = json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "hunter22",
        });
        let (status, reply) = self.post("/api/auth/register", None, &body).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {reply}");
        reply["token"]
            .as_str()
            .expect("register reply has a token")
            .to_string()
    }

    /// Create a product priced at `price` and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the product is rejected.
    pub async fn add_product(&self, token: &str, name: &str, price: &str) -> i64 {
        let body = json!({
            "name": name,
            "description": format!("{name} for end-to-end tests"),
            "price": price,
            "stock": 25,
            "category": "Testing",
            "image": "/uploads/test.png",
        });
        let (status, reply) = self.post("/api/products", Some(token), &body).await;
        assert_eq!(status, StatusCode::CREATED, "create product failed: {reply}");
        reply["product"]["id"]
            .as_i64()
            .expect("created product has an id")
    }

    /// Add `quantity` units of `product` to the caller's cart.
    ///
    /// # Panics
    ///
    /// Panics if the add is rejected.
    pub async fn add_to_cart(&self, token: &str, product: i64, quantity: i64) -> Value {
        let body = json!({ "productId": product, "quantity": quantity });
        let (status, cart) = self.post("/api/cart/add", Some(token), &body).await;
        assert_eq!(status, StatusCode::OK, "add to cart failed: {cart}");
        cart
    }

    /// Check out with a complete address.
    pub async fn checkout(&self, token: &str) -> Reply {
        self.post(
            "/api/orders/create",
            Some(token),
            &json!({ "shippingAddress": shipping_address() }),
        )
        .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A complete shipping address body.
#[must_use]
pub fn shipping_address() -> Value {
    json!({
        "street": "1 Main St",
        "city": "Springfield",
        "state": "IL",
        "zipCode": "62701",
        "country": "USA",
    })
}
