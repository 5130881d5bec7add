//! In-process cart and order backend.
//!
//! Every operation runs under one `tokio::sync::Mutex`, which makes each
//! mutation atomic. Used by the test suite and for exercising the navigator
//! without a database.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::error::ShopError;
use crate::model::{CartLine, Order, OrderId, UserId};
use crate::store::{snapshot_cart, CartStore, OrderStore};

#[derive(Debug, Default)]
struct MemoryState {
    carts: HashMap<UserId, Vec<CartLine>>,
    orders: Vec<Order>,
    last_order_id: i64,
    unavailable: bool,
}

impl MemoryState {
    fn check_available(&self) -> Result<(), ShopError> {
        if self.unavailable {
            return Err(ShopError::Storage(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

/// Cart and order store kept in memory
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    catalog: Arc<Catalog>,
}

impl MemoryStore {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            catalog,
        }
    }

    /// A handle on the same data that prices against another catalog,
    /// as after a restart with an updated menu
    pub fn with_catalog(&self, catalog: Arc<Catalog>) -> Self {
        Self {
            state: Arc::clone(&self.state),
            catalog,
        }
    }

    /// Make every subsequent operation fail with a storage error
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    /// Total number of orders across all users
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn get_quantity(&self, user: UserId, item_id: &str) -> Result<u32, ShopError> {
        let state = self.state.lock().await;
        state.check_available()?;
        Ok(state
            .carts
            .get(&user)
            .and_then(|lines| lines.iter().find(|line| line.item_id == item_id))
            .map_or(0, |line| line.quantity))
    }

    async fn add_one(&self, user: UserId, item_id: &str) -> Result<(), ShopError> {
        if !self.catalog.contains(item_id) {
            return Err(ShopError::UnknownItem(item_id.to_string()));
        }

        let mut state = self.state.lock().await;
        state.check_available()?;
        let lines = state.carts.entry(user).or_default();
        match lines.iter_mut().find(|line| line.item_id == item_id) {
            Some(line) => line.quantity += 1,
            None => lines.push(CartLine {
                user_id: user,
                item_id: item_id.to_string(),
                quantity: 1,
                created_at: Utc::now(),
            }),
        }
        Ok(())
    }

    async fn remove_one(&self, user: UserId, item_id: &str) -> Result<(), ShopError> {
        let mut state = self.state.lock().await;
        state.check_available()?;
        if let Some(lines) = state.carts.get_mut(&user) {
            if let Some(line) = lines.iter_mut().find(|line| line.item_id == item_id) {
                line.quantity = line.quantity.saturating_sub(1);
            }
            lines.retain(|line| line.quantity > 0);
        }
        Ok(())
    }

    async fn list_items(&self, user: UserId) -> Result<Vec<CartLine>, ShopError> {
        let state = self.state.lock().await;
        state.check_available()?;
        Ok(state
            .carts
            .get(&user)
            .map(|lines| {
                lines
                    .iter()
                    .filter(|line| line.quantity > 0)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn clear(&self, user: UserId) -> Result<(), ShopError> {
        let mut state = self.state.lock().await;
        state.check_available()?;
        state.carts.remove(&user);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create(&self, user: UserId, clear_cart: bool) -> Result<Order, ShopError> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        let lines: Vec<CartLine> = state
            .carts
            .get(&user)
            .map(|lines| lines.iter().filter(|l| l.quantity > 0).cloned().collect())
            .unwrap_or_default();
        let snapshot = snapshot_cart(&self.catalog, &lines)?;

        state.last_order_id += 1;
        let order = Order {
            id: OrderId(state.last_order_id),
            user_id: user,
            lines: snapshot.lines,
            total_amount: snapshot.total_amount,
            created_at: Utc::now(),
        };
        state.orders.push(order.clone());
        if clear_cart {
            state.carts.remove(&user);
        }
        Ok(order)
    }

    async fn get_by_id(&self, user: UserId, order_id: OrderId) -> Result<Order, ShopError> {
        let state = self.state.lock().await;
        state.check_available()?;
        state
            .orders
            .iter()
            .find(|order| order.id == order_id && order.user_id == user)
            .cloned()
            .ok_or(ShopError::NotFound(order_id))
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, ShopError> {
        let state = self.state.lock().await;
        state.check_available()?;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|order| order.user_id == user)
            .cloned()
            .collect())
    }
}
