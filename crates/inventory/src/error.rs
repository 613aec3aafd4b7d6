//! Stock service error types.

use lease::LockError;
use thiserror::Error;

/// Errors that can occur during stock operations.
#[derive(Debug, Error)]
pub enum StockError {
    /// No stock record for the product.
    #[error("Stock not found for product {0}")]
    NotFound(u64),

    /// Not enough units to take out.
    #[error("Insufficient stock for product {product_id}: {available} available, {requested} requested")]
    Insufficient {
        product_id: u64,
        available: i64,
        requested: i64,
    },

    /// Quantities in requests must be positive.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// The record is locked by a concurrent writer, or the lock store failed.
    #[error("Lock error: {0}")]
    Lock(#[from] LockError),

    /// Cached value could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing repository failed.
    #[error("Repository error: {0}")]
    Repository(String),
}

impl StockError {
    /// True when another request holds the record's lease.
    pub fn is_busy(&self) -> bool {
        matches!(self, StockError::Lock(LockError::Busy { .. }))
    }
}

/// Result type for stock operations.
pub type Result<T> = std::result::Result<T, StockError>;
