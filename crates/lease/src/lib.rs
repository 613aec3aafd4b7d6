//! Lease-based mutual exclusion for read-modify-write critical sections.
//!
//! A lease is a key written to a shared key-value store with a random token
//! and an expiry. Acquisition is a single "create if absent" write and never
//! blocks; release deletes the key only when it still holds the caller's
//! token, so a holder whose lease expired can never delete a successor's.

pub mod error;
pub mod lock;
pub mod memory;
pub mod store;

pub use error::{LockError, Result};
pub use lock::{DEFAULT_LEASE_TTL, DistributedLock, LockLease};
pub use memory::InMemoryLockStore;
pub use store::LockStore;
