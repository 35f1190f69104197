//! Order history for the signed-in user.

use tracing::instrument;

use emporium_core::{OrderId, UserId};

use super::ShopError;
use crate::db::Store;
use crate::models::Order;

/// Order service.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(&self, user: UserId) -> Result<Vec<Order>, ShopError> {
        Ok(self.store.list_orders(user).await?)
    }

    /// One of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` both when the order does not exist and
    /// when it belongs to someone else.
    #[instrument(skip(self))]
    pub async fn get(&self, user: UserId, id: OrderId) -> Result<Order, ShopError> {
        self.store
            .get_order(user, id)
            .await?
            .ok_or(ShopError::NotFound("Order"))
    }
}
