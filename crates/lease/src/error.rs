use thiserror::Error;

/// Errors that can occur when acquiring or releasing a lease.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another holder currently owns the lease. Retryable.
    #[error("Resource is locked: {key}")]
    Busy { key: String },

    /// The backing store failed.
    #[error("Lock store error: {0}")]
    Store(String),
}

impl LockError {
    /// Returns true when the caller may retry later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LockError::Busy { .. })
    }
}

/// Result type for lease operations.
pub type Result<T> = std::result::Result<T, LockError>;
