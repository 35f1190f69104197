//! Cart operations for the signed-in user.

use serde::Deserialize;
use tracing::instrument;

use emporium_core::{ProductId, Quantity, UserId, ValidationErrors};

use super::ShopError;
use crate::db::Store;
use crate::models::Cart;

/// Body of add and update requests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub product_id: Option<ProductId>,
    /// Defaults to one unit when omitted.
    pub quantity: Option<i64>,
}

impl CartLineInput {
    /// Check the product reference and quantity.
    ///
    /// # Errors
    ///
    /// Returns field errors for `productId` and `quantity`.
    pub fn validate(&self) -> Result<(ProductId, Quantity), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.product_id.is_none() {
            errors.add("productId", "productId is required");
        }
        let quantity = match self.quantity {
            None => Some(Quantity::ONE),
            Some(n) => Quantity::new(n)
                .map_err(|e| errors.add("quantity", e.to_string()))
                .ok(),
        };
        match (self.product_id, quantity) {
            (Some(product), Some(quantity)) => Ok((product, quantity)),
            _ => Err(errors),
        }
    }
}

/// Cart service.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's cart, created on first access.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn get(&self, user: UserId) -> Result<Cart, ShopError> {
        Ok(self.store.get_or_create_cart(user).await?)
    }

    /// Add units of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` for a bad body or a line over the
    /// quantity cap, and `ShopError::NotFound` for an unknown product.
    #[instrument(skip(self, input))]
    pub async fn add(&self, user: UserId, input: &CartLineInput) -> Result<Cart, ShopError> {
        let (product, quantity) = input.validate()?;
        let cart = self.store.add_item(user, product, quantity).await?;
        tracing::debug!(product_id = %product, quantity = %quantity, "added to cart");
        Ok(cart)
    }

    /// Set the quantity of a line that is already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if there is no cart or no such line.
    #[instrument(skip(self, input))]
    pub async fn update(&self, user: UserId, input: &CartLineInput) -> Result<Cart, ShopError> {
        let (product, quantity) = input.validate()?;
        Ok(self.store.set_quantity(user, product, quantity).await?)
    }

    /// Remove a product's line. Idempotent once the cart exists.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the user has no cart.
    #[instrument(skip(self))]
    pub async fn remove(&self, user: UserId, product: ProductId) -> Result<Cart, ShopError> {
        Ok(self.store.remove_item(user, product).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_defaults_to_one() {
        let input: CartLineInput = serde_json::from_str(r#"{"productId": 4}"#).unwrap();
        let (product, quantity) = input.validate().unwrap();
        assert_eq!(product, ProductId::new(4));
        assert_eq!(quantity, Quantity::ONE);
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let input: CartLineInput =
            serde_json::from_str(r#"{"productId": 4, "quantity": 0}"#).unwrap();
        assert!(input.validate().unwrap_err().has_field("quantity"));
    }

    #[test]
    fn test_missing_product_is_rejected() {
        let input: CartLineInput = serde_json::from_str(r#"{"quantity": 2}"#).unwrap();
        assert!(input.validate().unwrap_err().has_field("productId"));
    }
}
