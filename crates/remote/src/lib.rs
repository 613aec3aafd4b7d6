//! Outbound calls to collaborator services.
//!
//! A [`RemoteCaller`] sends one [`RemoteRequest`] and reports a classified
//! [`RemoteOutcome`]. Only transport faults are retried; any HTTP response is
//! a definite answer from the remote side and is returned as-is.

pub mod caller;
pub mod error;
pub mod http;
pub mod outcome;
pub mod request;
pub mod retry;
#[cfg(feature = "test-support")]
pub mod testing;

pub use caller::RemoteCaller;
pub use error::RemoteError;
pub use http::HttpRemoteCaller;
pub use outcome::{RemoteOutcome, classify};
pub use request::{Method, RemoteRequest};
pub use retry::{RetryPolicy, retry_transient};
