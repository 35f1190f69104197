use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use emporium_core::{OrderId, OrderStatus, Price, ProductId, Quantity, ShippingAddress, UserId};

use super::PgStore;
use super::cart::{lock_cart, touch_cart};
use crate::db::{OrderStore, RepositoryError};
use crate::models::{CheckoutError, CheckoutLine, Order, OrderDraft, OrderItem};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total: Decimal,
    status: OrderStatus,
    street: String,
    city: String,
    state: String,
    zip_code: String,
    country: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: ProductId,
    name: String,
    quantity: Quantity,
    unit_price: Price,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            items,
            total: self.total,
            shipping_address: ShippingAddress {
                street: self.street,
                city: self.city,
                state: self.state,
                zip_code: self.zip_code,
                country: self.country,
            },
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Attach line items to order rows, keeping the row order.
async fn with_items(
    conn: &mut PgConnection,
    rows: Vec<OrderRow>,
) -> Result<Vec<Order>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
    let item_rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT order_id, product_id, name, quantity, unit_price
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY id
        ",
    )
    .bind(ids)
    .fetch_all(conn)
    .await?;

    let mut items: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for row in item_rows {
        items.entry(row.order_id).or_default().push(OrderItem {
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            price: row.unit_price,
        });
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let lines = items.remove(&row.id).unwrap_or_default();
            row.into_order(lines)
        })
        .collect())
}

#[async_trait]
impl OrderStore for PgStore {
    async fn checkout(
        &self,
        user: UserId,
        shipping_address: &ShippingAddress,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        // Holding the cart row lock makes a second concurrent checkout wait,
        // then see the emptied cart.
        let Some(cart_id) = lock_cart(&mut tx, user).await? else {
            return Err(CheckoutError::EmptyCart);
        };

        let lines = sqlx::query_as::<_, CheckoutLine>(
            r"
            SELECT ci.product_id, ci.quantity, p.name, p.price
            FROM cart_items ci
            LEFT JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id
            ",
        )
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?;

        let draft = OrderDraft::price(user, lines, shipping_address.clone())?;

        let (order_id, created_at) = sqlx::query_as::<_, (OrderId, DateTime<Utc>)>(
            r"
            INSERT INTO orders (user_id, total, status, street, city, state, zip_code, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, created_at
            ",
        )
        .bind(user)
        .bind(draft.total)
        .bind(OrderStatus::Pending)
        .bind(&draft.shipping_address.street)
        .bind(&draft.shipping_address.city)
        .bind(&draft.shipping_address.state)
        .bind(&draft.shipping_address.zip_code)
        .bind(&draft.shipping_address.country)
        .fetch_one(&mut *tx)
        .await?;

        for item in &draft.items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, name, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        touch_cart(&mut tx, cart_id).await?;

        tx.commit().await?;

        Ok(draft.into_order(order_id, created_at))
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total, status, street, city, state, zip_code, country,
                   created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user)
        .fetch_all(&mut *conn)
        .await?;

        Ok(with_items(&mut conn, rows).await?)
    }

    async fn get_order(&self, user: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        // Filtering on user_id means another user's order looks exactly like
        // a missing one.
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total, status, street, city, state, zip_code, country,
                   created_at
            FROM orders
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(with_items(&mut conn, vec![row]).await?.into_iter().next())
    }
}
