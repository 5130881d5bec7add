//! # Cart and Order Data Model
//!
//! Plain data records shared by the stores, the navigator and the renderer.
//! Amounts are integers in the smallest unit the shop prices in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Telegram user identity as stored in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl From<teloxide::types::UserId> for UserId {
    fn from(id: teloxide::types::UserId) -> Self {
        // Telegram user ids fit in 52 bits
        UserId(id.0 as i64)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database-assigned order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One user's holding of one catalog item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub user_id: UserId,
    pub item_id: String,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// Frozen order line, serialized into the order's JSONB snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: String,
    pub quantity: u32,
    /// Catalog price captured when the order was created
    pub unit_price: i64,
}

impl OrderLine {
    pub fn subtotal(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price
    }
}

/// A finalized order; never mutated after creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
}
