//! # PostgreSQL Storage Module
//!
//! Cart lines and orders persisted in PostgreSQL through `sqlx`.
//!
//! ## Tables
//!
//! - `user_cart_items` - one row per (user, item), removed when the count drops to zero
//! - `user_orders` - append-only orders with a JSONB snapshot of their lines
//!
//! Cart mutations are single upserts or row-locked transactions, so concurrent
//! button presses never lose an update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::ShopError;
use crate::model::{CartLine, Order, OrderId, OrderLine, UserId};
use crate::store::{snapshot_cart, CartStore, OrderStore};

/// Create a connection pool
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_cart_items (
            tg_id BIGINT NOT NULL,
            item_id TEXT NOT NULL,
            count INTEGER NOT NULL CHECK (count >= 0),
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (tg_id, item_id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_orders (
            id BIGSERIAL PRIMARY KEY,
            tg_id BIGINT NOT NULL,
            cart_items JSONB NOT NULL,
            total_amount BIGINT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS user_orders_tg_id_idx ON user_orders (tg_id, id)")
        .execute(pool)
        .await?;

    info!("Database schema initialized successfully");
    Ok(())
}

#[derive(sqlx::FromRow)]
struct CartRow {
    tg_id: i64,
    item_id: String,
    count: i32,
    created_at: DateTime<Utc>,
}

fn quantity_from_count(item_id: &str, count: i32) -> Result<u32, ShopError> {
    u32::try_from(count)
        .map_err(|_| ShopError::Corrupt(format!("negative count for cart item {item_id}")))
}

impl TryFrom<CartRow> for CartLine {
    type Error = ShopError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let quantity = quantity_from_count(&row.item_id, row.count)?;
        Ok(CartLine {
            user_id: UserId(row.tg_id),
            item_id: row.item_id,
            quantity,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    tg_id: i64,
    cart_items: Json<Vec<OrderLine>>,
    total_amount: i64,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: OrderId(row.id),
            user_id: UserId(row.tg_id),
            lines: row.cart_items.0,
            total_amount: row.total_amount,
            created_at: row.created_at,
        }
    }
}

const SELECT_CART: &str = "SELECT tg_id, item_id, count, created_at FROM user_cart_items
     WHERE tg_id = $1 AND count > 0
     ORDER BY created_at, item_id";

/// Cart and order store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    catalog: Arc<Catalog>,
}

impl PgStore {
    pub fn new(pool: PgPool, catalog: Arc<Catalog>) -> Self {
        Self { pool, catalog }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn get_quantity(&self, user: UserId, item_id: &str) -> Result<u32, ShopError> {
        let count: Option<i32> = sqlx::query_scalar(
            "SELECT count FROM user_cart_items WHERE tg_id = $1 AND item_id = $2",
        )
        .bind(user.0)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        count.map_or(Ok(0), |count| quantity_from_count(item_id, count))
    }

    async fn add_one(&self, user: UserId, item_id: &str) -> Result<(), ShopError> {
        if !self.catalog.contains(item_id) {
            return Err(ShopError::UnknownItem(item_id.to_string()));
        }

        sqlx::query(
            "INSERT INTO user_cart_items (tg_id, item_id, count) VALUES ($1, $2, 1)
             ON CONFLICT (tg_id, item_id)
             DO UPDATE SET count = user_cart_items.count + 1",
        )
        .bind(user.0)
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user, item_id = %item_id, "Cart item incremented");
        Ok(())
    }

    async fn remove_one(&self, user: UserId, item_id: &str) -> Result<(), ShopError> {
        let mut tx = self.pool.begin().await?;

        // The UPDATE takes the row lock, so a concurrent decrement waits and
        // then sees our result.
        let remaining: Option<i32> = sqlx::query_scalar(
            "UPDATE user_cart_items SET count = GREATEST(count - 1, 0)
             WHERE tg_id = $1 AND item_id = $2
             RETURNING count",
        )
        .bind(user.0)
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?;

        if matches!(remaining, Some(count) if count <= 0) {
            sqlx::query(
                "DELETE FROM user_cart_items WHERE tg_id = $1 AND item_id = $2 AND count <= 0",
            )
            .bind(user.0)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(user_id = %user, item_id = %item_id, remaining = ?remaining, "Cart item decremented");
        Ok(())
    }

    async fn list_items(&self, user: UserId) -> Result<Vec<CartLine>, ShopError> {
        let rows: Vec<CartRow> = sqlx::query_as(SELECT_CART)
            .bind(user.0)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    async fn clear(&self, user: UserId) -> Result<(), ShopError> {
        let result = sqlx::query("DELETE FROM user_cart_items WHERE tg_id = $1")
            .bind(user.0)
            .execute(&self.pool)
            .await?;

        debug!(user_id = %user, removed = result.rows_affected(), "Cart cleared");
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create(&self, user: UserId, clear_cart: bool) -> Result<Order, ShopError> {
        let mut tx = self.pool.begin().await?;

        // Lock the cart rows so the snapshot cannot interleave with a press
        let select_for_update = format!("{SELECT_CART} FOR UPDATE");
        let rows: Vec<CartRow> = sqlx::query_as(&select_for_update)
            .bind(user.0)
            .fetch_all(&mut *tx)
            .await?;
        let lines = rows
            .into_iter()
            .map(CartLine::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let snapshot = snapshot_cart(&self.catalog, &lines)?;

        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO user_orders (tg_id, cart_items, total_amount)
             VALUES ($1, $2, $3)
             RETURNING id, created_at",
        )
        .bind(user.0)
        .bind(Json(&snapshot.lines))
        .bind(snapshot.total_amount)
        .fetch_one(&mut *tx)
        .await?;

        // A concurrent checkout blocked on the row locks above sees an empty
        // cart once this commits
        if clear_cart {
            sqlx::query("DELETE FROM user_cart_items WHERE tg_id = $1")
                .bind(user.0)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(
            user_id = %user,
            order_id = id,
            total_amount = snapshot.total_amount,
            lines = snapshot.lines.len(),
            cart_cleared = clear_cart,
            "Order created"
        );
        Ok(Order {
            id: OrderId(id),
            user_id: user,
            lines: snapshot.lines,
            total_amount: snapshot.total_amount,
            created_at,
        })
    }

    async fn get_by_id(&self, user: UserId, order_id: OrderId) -> Result<Order, ShopError> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT id, tg_id, cart_items, total_amount, created_at FROM user_orders
             WHERE id = $1 AND tg_id = $2",
        )
        .bind(order_id.0)
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::from).ok_or(ShopError::NotFound(order_id))
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, ShopError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, tg_id, cart_items, total_amount, created_at FROM user_orders
             WHERE tg_id = $1
             ORDER BY id DESC",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_from_count() {
        assert_eq!(quantity_from_count("latte", 3).unwrap(), 3);
        assert_eq!(quantity_from_count("latte", 0).unwrap(), 0);
    }

    #[test]
    fn test_negative_count_is_corrupt() {
        let result = quantity_from_count("latte", -1);
        assert!(matches!(result, Err(ShopError::Corrupt(msg)) if msg.contains("latte")));

        let row = CartRow {
            tg_id: 1,
            item_id: "latte".to_string(),
            count: -2,
            created_at: Utc::now(),
        };
        assert!(matches!(CartLine::try_from(row), Err(ShopError::Corrupt(_))));
    }
}
