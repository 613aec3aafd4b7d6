use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Key-value primitives a lease needs from its backing store.
///
/// Each method must be atomic with respect to every other call on the same
/// key. A Redis-backed implementation maps these onto `SET key token NX EX ttl`
/// and a compare-and-delete script.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Writes `token` under `key` with the given expiry, only if `key` is
    /// absent (or expired). Returns whether the write happened.
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> Result<bool>;

    /// Deletes `key` only if its current value equals `token`.
    /// Returns whether an entry was deleted.
    async fn delete_if_equals(&self, key: &str, token: &str) -> Result<bool>;

    /// Returns the live token stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

#[async_trait]
impl<T: LockStore + ?Sized> LockStore for Arc<T> {
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> Result<bool> {
        (**self).set_if_absent(key, token, ttl).await
    }

    async fn delete_if_equals(&self, key: &str, token: &str) -> Result<bool> {
        (**self).delete_if_equals(key, token).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }
}
