//! Remote call error types.

use thiserror::Error;

/// A non-success outcome of a remote call, in `?`-friendly form.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// Transport fault that survived every retry attempt.
    #[error("Transient network failure: {0}")]
    Transient(String),

    /// The remote resource does not exist.
    #[error("Resource not found")]
    NotFound,

    /// The remote service refused the request because of a conflict.
    #[error("Conflict: the remote service rejected the request")]
    Conflict,

    /// The remote service rejected the payload.
    #[error("Invalid data: {0}")]
    Validation(String),

    /// The remote service failed internally.
    #[error("Remote server error (status {status})")]
    Server { status: u16 },

    /// A status nobody expected.
    #[error("Unexpected response: {status} - {body}")]
    Unexpected { status: u16, body: String },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl RemoteError {
    /// HTTP status the remote side answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::NotFound => Some(404),
            RemoteError::Conflict => Some(409),
            RemoteError::Validation(_) => Some(422),
            RemoteError::Server { status } | RemoteError::Unexpected { status, .. } => {
                Some(*status)
            }
            RemoteError::Transient(_) | RemoteError::Client(_) => None,
        }
    }
}
