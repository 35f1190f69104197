use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use emporium_core::{CartId, ProductId, Quantity, UserId};

use super::PgStore;
use crate::db::{CartStore, RepositoryError};
use crate::models::{Cart, CartError, CartItem, Product};

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    quantity: Quantity,
    #[sqlx(flatten)]
    product: Product,
}

/// The user's cart id, creating the cart if needed. Locks the cart row
/// until the surrounding transaction ends.
async fn lock_or_create_cart(conn: &mut PgConnection, user: UserId) -> Result<CartId, sqlx::Error> {
    sqlx::query_scalar::<_, CartId>(
        r"
        INSERT INTO carts (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) DO UPDATE SET updated_at = now()
        RETURNING id
        ",
    )
    .bind(user)
    .fetch_one(conn)
    .await
}

/// The user's cart id if one exists, locked until the transaction ends.
pub(super) async fn lock_cart(
    conn: &mut PgConnection,
    user: UserId,
) -> Result<Option<CartId>, sqlx::Error> {
    sqlx::query_scalar::<_, CartId>("SELECT id FROM carts WHERE user_id = $1 FOR UPDATE")
        .bind(user)
        .fetch_optional(conn)
        .await
}

pub(super) async fn touch_cart(conn: &mut PgConnection, cart: CartId) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
        .bind(cart)
        .execute(conn)
        .await?;
    Ok(())
}

/// Load a cart joined with the current product rows.
async fn load_cart(conn: &mut PgConnection, user: UserId) -> Result<Option<Cart>, sqlx::Error> {
    let Some(row) = sqlx::query_as::<_, CartRow>(
        "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = $1",
    )
    .bind(user)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, CartItemRow>(
        r"
        SELECT ci.quantity,
               p.id, p.name, p.description, p.price, p.stock, p.category, p.image,
               p.created_at, p.updated_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.id
        ",
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|r| CartItem {
        product: r.product,
        quantity: r.quantity,
    })
    .collect();

    Ok(Some(Cart::new(
        row.id,
        row.user_id,
        items,
        row.created_at,
        row.updated_at,
    )))
}

async fn load_existing_cart(conn: &mut PgConnection, user: UserId) -> Result<Cart, CartError> {
    load_cart(conn, user).await?.ok_or(CartError::CartNotFound)
}

#[async_trait]
impl CartStore for PgStore {
    async fn get_or_create_cart(&self, user: UserId) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user)
            .execute(&mut *tx)
            .await?;
        let cart = load_cart(&mut tx, user)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(cart)
    }

    async fn add_item(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;

        // FOR SHARE keeps the product from being deleted before the line is written
        let exists = sqlx::query_scalar::<_, ProductId>(
            "SELECT id FROM products WHERE id = $1 FOR SHARE",
        )
        .bind(product)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Err(CartError::ProductNotFound(product));
        }

        let cart_id = lock_or_create_cart(&mut tx, user).await?;

        let existing = sqlx::query_scalar::<_, Quantity>(
            "SELECT quantity FROM cart_items WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product)
        .fetch_optional(&mut *tx)
        .await?;

        let new_quantity = match existing {
            Some(current) => current.checked_add(quantity)?,
            None => quantity,
        };

        sqlx::query(
            r"
            INSERT INTO cart_items (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(cart_id)
        .bind(product)
        .bind(new_quantity)
        .execute(&mut *tx)
        .await?;

        let cart = load_existing_cart(&mut tx, user).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn set_quantity(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;

        let cart_id = lock_cart(&mut tx, user)
            .await?
            .ok_or(CartError::CartNotFound)?;

        let updated = sqlx::query(
            "UPDATE cart_items SET quantity = $3 WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(CartError::ItemNotFound(product));
        }
        touch_cart(&mut tx, cart_id).await?;

        let cart = load_existing_cart(&mut tx, user).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn remove_item(&self, user: UserId, product: ProductId) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;

        let cart_id = lock_cart(&mut tx, user)
            .await?
            .ok_or(CartError::CartNotFound)?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product)
            .execute(&mut *tx)
            .await?;
        touch_cart(&mut tx, cart_id).await?;

        let cart = load_existing_cart(&mut tx, user).await?;
        tx.commit().await?;
        Ok(cart)
    }
}
