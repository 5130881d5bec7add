//! # Cart and Order Store Traits
//!
//! Backends implement [`CartStore`] and [`OrderStore`]. The PostgreSQL backend
//! lives in [`crate::db`], the in-process one in [`crate::memory_store`].
//!
//! Cart mutations must be single atomic operations: two button presses from the
//! same user can be handled at the same time, and a read-then-write pair would
//! lose one of them.

use async_trait::async_trait;

use crate::catalog::Catalog;
use crate::error::ShopError;
use crate::model::{CartLine, Order, OrderId, OrderLine, UserId};

/// Per-user cart storage
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Quantity of `item_id` in the user's cart, 0 when absent
    async fn get_quantity(&self, user: UserId, item_id: &str) -> Result<u32, ShopError>;

    /// Increment the line for `item_id`, creating it with quantity 1 if needed
    ///
    /// # Errors
    ///
    /// `ShopError::UnknownItem` when the id is not in the catalog.
    async fn add_one(&self, user: UserId, item_id: &str) -> Result<(), ShopError>;

    /// Decrement the line for `item_id`, dropping it once it reaches zero.
    /// Does nothing when the line does not exist.
    async fn remove_one(&self, user: UserId, item_id: &str) -> Result<(), ShopError>;

    /// Lines with a positive quantity, in insertion order
    async fn list_items(&self, user: UserId) -> Result<Vec<CartLine>, ShopError>;

    /// Remove every line of the user's cart
    async fn clear(&self, user: UserId) -> Result<(), ShopError>;
}

/// Append-only order log
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Snapshot the user's cart into a new order and return it.
    /// With `clear_cart` the cart is emptied in the same atomic step, otherwise
    /// it is left untouched.
    ///
    /// # Errors
    ///
    /// - `ShopError::EmptyCart` when the cart has no lines
    /// - `ShopError::UnknownItem` when a line references a retired catalog id
    async fn create(&self, user: UserId, clear_cart: bool) -> Result<Order, ShopError>;

    /// Fetch an order owned by `user`
    ///
    /// # Errors
    ///
    /// `ShopError::NotFound` when the order is missing or owned by someone else.
    async fn get_by_id(&self, user: UserId, order_id: OrderId) -> Result<Order, ShopError>;

    /// All orders of the user, newest first
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, ShopError>;
}

/// Priced copy of a cart, ready to be persisted as an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    pub lines: Vec<OrderLine>,
    pub total_amount: i64,
}

/// Capture current catalog prices for every cart line
pub fn snapshot_cart(catalog: &Catalog, lines: &[CartLine]) -> Result<CartSnapshot, ShopError> {
    if lines.is_empty() {
        return Err(ShopError::EmptyCart);
    }

    let lines = lines
        .iter()
        .map(|line| {
            let item = catalog
                .get(&line.item_id)
                .ok_or_else(|| ShopError::UnknownItem(line.item_id.clone()))?;
            Ok(OrderLine {
                item_id: line.item_id.clone(),
                quantity: line.quantity,
                unit_price: item.unit_price,
            })
        })
        .collect::<Result<Vec<_>, ShopError>>()?;

    let total_amount = lines.iter().map(OrderLine::subtotal).sum();

    Ok(CartSnapshot {
        lines,
        total_amount,
    })
}
