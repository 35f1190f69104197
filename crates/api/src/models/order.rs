//! Orders and the pricing step of checkout.
//!
//! An order is an immutable snapshot. Its lines copy the product name and
//! the unit price at the moment of checkout, and the total is computed once
//! from those lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use emporium_core::{OrderId, OrderStatus, Price, ProductId, Quantity, ShippingAddress, UserId};

use crate::db::RepositoryError;

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: Quantity,
    /// Unit price captured at checkout.
    pub price: Price,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A cart line as seen by checkout, joined with whatever the catalog
/// currently holds for its product.
///
/// `name` and `price` are `None` when the product no longer exists.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub name: Option<String>,
    pub price: Option<Price>,
}

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    /// Some cart lines reference products that no longer exist.
    #[error("products no longer available: {}", join_ids(.0))]
    UnavailableProducts(Vec<ProductId>),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

fn join_ids(ids: &[ProductId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A fully priced order that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub shipping_address: ShippingAddress,
}

impl OrderDraft {
    /// Price `lines` at their current catalog prices.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if there are no lines and
    /// [`CheckoutError::UnavailableProducts`] if any line lost its product.
    pub fn price(
        user_id: UserId,
        lines: Vec<CheckoutLine>,
        shipping_address: ShippingAddress,
    ) -> Result<Self, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut items = Vec::with_capacity(lines.len());
        let mut missing = Vec::new();
        for line in lines {
            match (line.name, line.price) {
                (Some(name), Some(price)) => items.push(OrderItem {
                    product_id: line.product_id,
                    name,
                    quantity: line.quantity,
                    price,
                }),
                _ => missing.push(line.product_id),
            }
        }
        if !missing.is_empty() {
            return Err(CheckoutError::UnavailableProducts(missing));
        }

        let mut total: Decimal = items
            .iter()
            .map(|item| item.price.times(item.quantity))
            .sum();
        total.rescale(2);

        Ok(Self {
            user_id,
            items,
            total,
            shipping_address,
        })
    }

    /// The order this draft becomes once stored. Status is always pending.
    #[must_use]
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            user_id: self.user_id,
            items: self.items,
            total: self.total,
            shipping_address: self.shipping_address,
            status: OrderStatus::Pending,
            created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
            country: "USA".to_string(),
        }
    }

    fn line(id: i32, qty: i64, price: Option<&str>) -> CheckoutLine {
        CheckoutLine {
            product_id: ProductId::new(id),
            quantity: Quantity::new(qty).unwrap(),
            name: price.map(|_| format!("Product {id}")),
            price: price.map(|p| Price::new(Decimal::from_str(p).unwrap()).unwrap()),
        }
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let draft = OrderDraft::price(
            UserId::new(7),
            vec![line(1, 2, Some("10.00")), line(2, 1, Some("5.00"))],
            address(),
        )
        .unwrap();
        assert_eq!(draft.total.to_string(), "25.00");
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[0].price.to_string(), "10.00");
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let err = OrderDraft::price(UserId::new(7), Vec::new(), address()).unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[test]
    fn test_missing_products_are_named() {
        let err = OrderDraft::price(
            UserId::new(7),
            vec![line(1, 1, Some("3.00")), line(4, 1, None), line(9, 2, None)],
            address(),
        )
        .unwrap_err();
        match err {
            CheckoutError::UnavailableProducts(ids) => {
                assert_eq!(ids, vec![ProductId::new(4), ProductId::new(9)]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_into_order_is_pending() {
        let draft =
            OrderDraft::price(UserId::new(7), vec![line(1, 3, Some("0.10"))], address()).unwrap();
        let order = draft.into_order(OrderId::new(1), Utc::now());
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total.to_string(), "0.30");
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["shippingAddress"]["zipCode"], "62701");
        assert_eq!(json["items"][0]["productId"], 1);
    }
}
