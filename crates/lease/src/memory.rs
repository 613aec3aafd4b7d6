use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::Result;
use crate::store::LockStore;

#[derive(Debug, Clone)]
struct Entry {
    token: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory lock store for tests and single-process deployments.
///
/// Every primitive runs under one mutex acquisition, which makes the
/// conditional write and the compare-and-delete atomic. Expiry uses the tokio
/// clock so paused-time tests can fast-forward past a lease TTL.
#[derive(Clone, Default)]
pub struct InMemoryLockStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl InMemoryLockStore {
    /// Creates a new empty lock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live leases.
    pub async fn live_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        if let Some(existing) = entries.get(key)
            && existing.is_live(now)
        {
            return Ok(false);
        }

        entries.insert(
            key.to_string(),
            Entry {
                token: token.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn delete_if_equals(&self, key: &str, token: &str) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        match entries.get(key) {
            Some(entry) if entry.token == token && entry.is_live(now) => {
                entries.remove(key);
                Ok(true)
            }
            Some(entry) if !entry.is_live(now) => {
                // Lazily drop expired entries; nobody owns them anymore.
                entries.remove(key);
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.token.clone()))
    }
}
