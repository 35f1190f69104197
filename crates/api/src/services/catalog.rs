//! Product catalog management.

use tracing::instrument;

use emporium_core::{ProductId, Role, UserId};

use super::ShopError;
use crate::db::Store;
use crate::models::{Product, ProductInput};

/// Catalog service.
///
/// Listing is public. Creating and deleting products needs a signed-in
/// user, and an admin when `admin_only` is set.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
    admin_only: bool,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, admin_only: bool) -> Self {
        Self { store, admin_only }
    }

    /// Every product, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if the store fails.
    pub async fn list(&self) -> Result<Vec<Product>, ShopError> {
        Ok(self.store.list_products().await?)
    }

    /// Validate and add a product.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Forbidden` if the caller may not edit the catalog
    /// and `ShopError::Validation` for invalid fields.
    #[instrument(skip(self, input))]
    pub async fn create(&self, actor: UserId, input: &ProductInput) -> Result<Product, ShopError> {
        self.authorize(actor).await?;
        let product = input.validate()?;
        let created = self.store.create_product(&product).await?;
        tracing::info!(product_id = %created.id, name = %created.name, "product created");
        Ok(created)
    }

    /// Delete a product. Cart lines that reference it go with it; past
    /// orders keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Forbidden` if the caller may not edit the catalog
    /// and `ShopError::NotFound` if there is no such product.
    #[instrument(skip(self))]
    pub async fn delete(&self, actor: UserId, id: ProductId) -> Result<(), ShopError> {
        self.authorize(actor).await?;
        let product = self
            .store
            .get_product(id)
            .await?
            .ok_or(ShopError::NotFound("Product"))?;
        // A concurrent delete may win between the lookup and this call.
        if !self.store.delete_product(id).await? {
            return Err(ShopError::NotFound("Product"));
        }
        tracing::info!(product_id = %id, name = %product.name, "product deleted");
        Ok(())
    }

    async fn authorize(&self, actor: UserId) -> Result<(), ShopError> {
        if !self.admin_only {
            return Ok(());
        }
        match self.store.get_user(actor).await? {
            Some(user) if user.role == Role::Admin => Ok(()),
            _ => Err(ShopError::Forbidden("catalog changes require an admin")),
        }
    }
}
