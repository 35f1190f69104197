//! Business logic between the HTTP handlers and the store.
//!
//! Services borrow the store from `AppState` for the duration of a request
//! and translate store errors into [`ShopError`] / [`AuthError`].

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;

use thiserror::Error;

use emporium_core::ValidationErrors;

use crate::db::RepositoryError;
use crate::models::{CartError, CheckoutError};

pub use auth::AuthError;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use orders::OrderService;

/// Errors from catalog, cart, checkout and order operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// One or more submitted fields are invalid.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The named resource does not exist (or is not visible to the caller).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Checkout was attempted with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The caller is authenticated but not allowed to do this.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ValidationErrors> for ShopError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<CartError> for ShopError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ProductNotFound(_) => Self::NotFound("Product"),
            CartError::CartNotFound => Self::NotFound("Cart"),
            CartError::ItemNotFound(_) => Self::NotFound("Cart item"),
            CartError::Quantity(e) => Self::Validation(ValidationErrors::single(
                "quantity",
                e.to_string(),
            )),
            CartError::Repository(e) => Self::Repository(e),
        }
    }
}

impl From<CheckoutError> for ShopError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => Self::EmptyCart,
            err @ CheckoutError::UnavailableProducts(_) => {
                Self::Validation(ValidationErrors::single("items", err.to_string()))
            }
            CheckoutError::Repository(e) => Self::Repository(e),
        }
    }
}
