//! # Error Types Module
//!
//! Errors raised by the catalog, cart and order stores. The navigation layer
//! recovers from the domain variants locally; storage variants propagate to the
//! Telegram handlers, which log them and leave the screen untouched.

use thiserror::Error;

use crate::model::OrderId;

/// Errors produced by shop operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// A token or cart line references an id missing from the catalog
    #[error("Unknown catalog item: {0}")]
    UnknownItem(String),
    /// The order does not exist or belongs to another user
    #[error("Order not found: {0}")]
    NotFound(OrderId),
    /// Checkout was requested with nothing in the cart
    #[error("Cart is empty")]
    EmptyCart,
    /// The database could not be reached or rejected the statement
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
    /// A persisted row could not be mapped back into the model
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl ShopError {
    /// Whether the error is a storage-level failure rather than a domain outcome
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, ShopError::Storage(_) | ShopError::Corrupt(_))
    }
}
