//! Cache collaborator used for cache-aside reads.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Key-value cache with per-entry expiry.
///
/// A cache is an optimisation only: implementations backed by a remote store
/// should log their own failures and behave like a miss.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value, ttl: Duration);
    async fn delete(&self, key: &str);
}

#[async_trait]
impl<T: Cache + ?Sized> Cache for Arc<T> {
    async fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        (**self).set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) {
        (**self).delete(key).await
    }
}

/// In-memory cache for tests and single-process deployments.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, (Value, Instant)>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a live entry exists for `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(value, _)| value.clone())
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, Instant::now() + ttl));
    }

    async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}
