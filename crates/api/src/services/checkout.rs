//! Checkout: turn the signed-in user's cart into an order.

use serde::Deserialize;
use tracing::instrument;

use emporium_core::{ShippingAddressInput, UserId};

use super::ShopError;
use crate::db::Store;
use crate::error::add_breadcrumb;
use crate::models::Order;

/// Body of the create-order request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    #[serde(default)]
    pub shipping_address: ShippingAddressInput,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    store: &'a dyn Store,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Place an order for everything in the user's cart.
    ///
    /// The address is checked before the cart is touched, so an invalid
    /// address never changes any state. The order is priced at current
    /// catalog prices and the cart is emptied in the same unit of work.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` for an incomplete address or a cart
    /// line whose product no longer exists, and `ShopError::EmptyCart` if
    /// there is nothing to buy.
    #[instrument(skip(self, input))]
    pub async fn place_order(
        &self,
        user: UserId,
        input: &CheckoutInput,
    ) -> Result<Order, ShopError> {
        let address = input.shipping_address.validate("shippingAddress")?;

        let order = self.store.checkout(user, &address).await?;

        tracing::info!(
            user_id = %user,
            order_id = %order.id,
            total = %order.total,
            items = order.items.len(),
            "order placed"
        );
        let order_id = order.id.to_string();
        add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));

        Ok(order)
    }
}
