use async_trait::async_trait;

use emporium_core::ProductId;

use super::PgStore;
use crate::db::{CatalogStore, RepositoryError};
use crate::models::{NewProduct, Product};

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, stock, category, image,
                   created_at, updated_at
            FROM products
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, stock, category, image,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let created = sqlx::query_as::<_, Product>(
            r"
            INSERT INTO products (name, description, price, stock, category, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, price, stock, category, image,
                      created_at, updated_at
            ",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.category)
        .bind(&product.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        // cart_items rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
