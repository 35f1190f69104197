//! Persistence for the shop.
//!
//! All storage goes through the [`Store`] trait so handlers never know which
//! backend they are talking to.
//!
//! - [`PgStore`] - durable `PostgreSQL` storage
//! - [`MemoryStore`] - process-local storage for tests and local demos
//!
//! # Tables
//!
//! - `users` - accounts with argon2 password hashes
//! - `products` - the catalog
//! - `carts` / `cart_items` - one cart per user, one line per product
//! - `orders` / `order_items` - placed orders with price snapshots
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p emporium-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use emporium_core::{Email, OrderId, ProductId, Quantity, ShippingAddress, UserId};

use crate::config::StoreConfig;
use crate::models::{
    Cart, CartError, CheckoutError, NewProduct, NewUser, Order, Product, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Open the configured backend.
///
/// # Errors
///
/// Returns `sqlx::Error` if the `PostgreSQL` pool cannot be created.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn Store>, sqlx::Error> {
    match config {
        StoreConfig::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            tracing::info!("Database pool created");
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreConfig::Memory => {
            tracing::warn!("using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Product catalog storage.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All products, ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// Delete a product and every cart line that references it.
    ///
    /// Returns `false` if the product did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

/// Cart storage. Every mutation returns the cart as it stands afterwards.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's cart, created empty on first use.
    async fn get_or_create_cart(&self, user: UserId) -> Result<Cart, RepositoryError>;

    /// Add `quantity` units of `product`, merging with an existing line.
    async fn add_item(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, CartError>;

    /// Replace the quantity of an existing line.
    async fn set_quantity(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, CartError>;

    /// Drop the line for `product`. Removing an absent line is not an error,
    /// but the user must already have a cart.
    async fn remove_item(&self, user: UserId, product: ProductId) -> Result<Cart, CartError>;
}

/// Order storage, including the checkout transition from cart to order.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Turn the user's cart into a pending order and empty the cart.
    ///
    /// Pricing, the order insert and clearing the cart happen as one unit:
    /// either all of it is visible afterwards or none of it is.
    async fn checkout(
        &self,
        user: UserId,
        shipping_address: &ShippingAddress,
    ) -> Result<Order, CheckoutError>;

    /// The user's orders, newest first.
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// One order, only if `user` owns it.
    async fn get_order(&self, user: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError>;
}

/// User account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// A user and their password hash, looked up by email.
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError>;

    /// Change username and/or email. `None` leaves a field as it is.
    async fn update_profile(
        &self,
        id: UserId,
        username: Option<&str>,
        email: Option<&Email>,
    ) -> Result<User, RepositoryError>;

    async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<(), RepositoryError>;
}

/// Everything the API needs from a backend.
#[async_trait]
pub trait Store: CatalogStore + CartStore + OrderStore + UserStore {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
