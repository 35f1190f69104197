//! Shopping carts.
//!
//! A cart belongs to exactly one user and holds at most one line per
//! product. Lines are joined with the current catalog entry whenever the
//! cart is read, so prices shown here are always live prices.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use emporium_core::{CartId, ProductId, Quantity, QuantityError, UserId};

use super::product::Product;
use crate::db::RepositoryError;

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product: Product,
    pub quantity: Quantity,
}

impl CartItem {
    /// Current price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.times(self.quantity)
    }
}

/// A user's cart with its lines in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    /// Sum of line totals at current prices.
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Assemble a cart and compute its running total.
    #[must_use]
    pub fn new(
        id: CartId,
        user_id: UserId,
        items: Vec<CartItem>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let mut total: Decimal = items.iter().map(CartItem::line_total).sum();
        total.rescale(2);
        Self {
            id,
            user_id,
            items,
            total,
            created_at,
            updated_at,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity of `product` in the cart, if present.
    #[must_use]
    pub fn quantity_of(&self, product: ProductId) -> Option<Quantity> {
        self.items
            .iter()
            .find(|item| item.product.id == product)
            .map(|item| item.quantity)
    }
}

/// Errors from cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product does not exist in the catalog.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The user has never had a cart.
    #[error("cart not found")]
    CartNotFound,

    /// The product has no line in the cart.
    #[error("product {0} is not in the cart")]
    ItemNotFound(ProductId),

    /// The resulting line quantity is out of range.
    #[error("invalid quantity: {0}")]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}
