//! Lease acquisition and ownership-checked release.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use uuid::Uuid;

use crate::error::LockError;
use crate::store::LockStore;

/// Default lease lifetime; a safety net, not the release mechanism.
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(10);

/// Proof of ownership of a lease.
///
/// The token is a random nonce; only the holder of this value can release
/// the lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockLease {
    key: String,
    token: String,
    ttl: Duration,
}

impl LockLease {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Non-blocking mutual exclusion over a [`LockStore`].
#[derive(Debug, Clone)]
pub struct DistributedLock<S> {
    store: Arc<S>,
    default_ttl: Duration,
}

impl<S: LockStore> DistributedLock<S> {
    /// Creates a lock client using [`DEFAULT_LEASE_TTL`].
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, DEFAULT_LEASE_TTL)
    }

    /// Creates a lock client with a custom default TTL.
    pub fn with_ttl(store: S, default_ttl: Duration) -> Self {
        Self {
            store: Arc::new(store),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Attempts to take the lease on `key` exactly once.
    ///
    /// Fails immediately with [`LockError::Busy`] when someone else holds it.
    #[tracing::instrument(skip(self), fields(ttl_secs = ttl.as_secs()))]
    pub async fn acquire(&self, key: &str, ttl: Duration) -> Result<LockLease, LockError> {
        let token = Uuid::new_v4().to_string();

        if self.store.set_if_absent(key, &token, ttl).await? {
            metrics::counter!("lease_acquired_total").increment(1);
            tracing::debug!(key, "lease acquired");
            Ok(LockLease {
                key: key.to_string(),
                token,
                ttl,
            })
        } else {
            metrics::counter!("lease_busy_total").increment(1);
            tracing::debug!(key, "lease busy");
            Err(LockError::Busy {
                key: key.to_string(),
            })
        }
    }

    /// Releases the lease if it is still ours.
    ///
    /// Returns `false` when the lease had already expired (and possibly been
    /// re-acquired by someone else); the store is left untouched in that case.
    #[tracing::instrument(skip(self, lease), fields(key = %lease.key))]
    pub async fn release(&self, lease: &LockLease) -> Result<bool, LockError> {
        let released = self.store.delete_if_equals(&lease.key, &lease.token).await?;
        if !released {
            metrics::counter!("lease_release_stale_total").increment(1);
            tracing::warn!("lease expired before release; critical section outlived its TTL");
        }
        Ok(released)
    }

    /// Runs `critical_section` while holding the lease on `key`.
    ///
    /// The lease is released on every exit path: `Ok`, `Err`, a panic inside
    /// the section (re-raised after the release), or the returned future being
    /// dropped mid-section (released from a background task). A release
    /// failure is logged and does not mask the section's own result; the TTL
    /// cleans up in that case.
    pub async fn with_lock<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        critical_section: F,
    ) -> Result<T, E>
    where
        S: 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        let lease = self.acquire(key, ttl).await?;
        let guard = ReleaseOnDrop::new(self.store.clone(), lease.clone());

        let outcome = AssertUnwindSafe(critical_section()).catch_unwind().await;

        if let Err(e) = self.release(&lease).await {
            tracing::error!(key, error = %e, "failed to release lease");
        }
        guard.disarm();

        match outcome {
            Ok(result) => result,
            Err(panic) => {
                tracing::error!(key, "critical section panicked; lease released");
                std::panic::resume_unwind(panic)
            }
        }
    }

    /// [`with_lock`](Self::with_lock) using the default TTL.
    pub async fn with_default_lock<T, E, F, Fut>(
        &self,
        key: &str,
        critical_section: F,
    ) -> Result<T, E>
    where
        S: 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        self.with_lock(key, self.default_ttl, critical_section).await
    }
}

/// Releases an abandoned lease when a `with_lock` future is dropped before
/// its section finishes.
struct ReleaseOnDrop<S: LockStore + 'static> {
    store: Arc<S>,
    lease: Option<LockLease>,
}

impl<S: LockStore + 'static> ReleaseOnDrop<S> {
    fn new(store: Arc<S>, lease: LockLease) -> Self {
        Self {
            store,
            lease: Some(lease),
        }
    }

    fn disarm(mut self) {
        self.lease = None;
    }
}

impl<S: LockStore + 'static> Drop for ReleaseOnDrop<S> {
    fn drop(&mut self) {
        let Some(lease) = self.lease.take() else {
            return;
        };
        metrics::counter!("lease_abandoned_total").increment(1);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(key = %lease.key, "no runtime to release abandoned lease; TTL will reclaim it");
            return;
        };
        let store = self.store.clone();
        runtime.spawn(async move {
            match store.delete_if_equals(&lease.key, &lease.token).await {
                Ok(_) => tracing::debug!(key = %lease.key, "abandoned lease released"),
                Err(e) => tracing::error!(key = %lease.key, error = %e, "failed to release abandoned lease"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLockStore;

    fn lock() -> DistributedLock<InMemoryLockStore> {
        DistributedLock::new(InMemoryLockStore::new())
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let lock = lock();
        let lease = lock.acquire("stock_lock_1", DEFAULT_LEASE_TTL).await.unwrap();

        assert_eq!(lease.key(), "stock_lock_1");
        assert_eq!(
            lock.store().get("stock_lock_1").await.unwrap().as_deref(),
            Some(lease.token())
        );

        assert!(lock.release(&lease).await.unwrap());
        assert_eq!(lock.store().get("stock_lock_1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_second_acquire_is_busy() {
        let lock = lock();
        let _lease = lock.acquire("k", DEFAULT_LEASE_TTL).await.unwrap();

        let err = lock.acquire("k", DEFAULT_LEASE_TTL).await.unwrap_err();
        assert!(matches!(err, LockError::Busy { ref key } if key == "k"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let lock = lock();
        let a = lock.acquire("a", DEFAULT_LEASE_TTL).await.unwrap();
        let b = lock.acquire("b", DEFAULT_LEASE_TTL).await.unwrap();
        assert_ne!(a.token(), b.token());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_release_keeps_new_holder() {
        let lock = lock();
        let stale = lock.acquire("k", Duration::from_secs(1)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        let current = lock.acquire("k", Duration::from_secs(10)).await.unwrap();

        assert!(!lock.release(&stale).await.unwrap());
        assert_eq!(
            lock.store().get("k").await.unwrap().as_deref(),
            Some(current.token())
        );
    }

    #[tokio::test]
    async fn test_with_lock_releases_on_error() {
        let lock = lock();

        let result: Result<(), LockError> = lock
            .with_default_lock("k", || async {
                Err(LockError::Store("rejected".to_string()))
            })
            .await;

        assert!(matches!(result, Err(LockError::Store(_))));
        assert_eq!(lock.store().live_count().await, 0);
    }

    #[tokio::test]
    async fn test_with_lock_releases_on_panic() {
        let lock = Arc::new(lock());
        let task_lock = lock.clone();

        let joined = tokio::spawn(async move {
            let fail = true;
            let _: Result<(), LockError> = task_lock
                .with_default_lock("k", || async move {
                    if fail {
                        panic!("section failed");
                    }
                    Ok(())
                })
                .await;
        })
        .await;

        assert!(joined.unwrap_err().is_panic());
        assert_eq!(lock.store().live_count().await, 0);
        assert!(lock.acquire("k", DEFAULT_LEASE_TTL).await.is_ok());
    }

    #[tokio::test]
    async fn test_with_lock_releases_when_dropped_mid_section() {
        let lock = lock();

        let section = lock.with_default_lock("k", || async {
            std::future::pending::<()>().await;
            Ok::<(), LockError>(())
        });
        assert!(
            tokio::time::timeout(Duration::from_millis(20), section)
                .await
                .is_err()
        );

        for _ in 0..10 {
            if lock.store().live_count().await == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(lock.store().live_count().await, 0);
    }

    #[tokio::test]
    async fn test_with_lock_busy_skips_section() {
        let lock = lock();
        let _held = lock.acquire("k", DEFAULT_LEASE_TTL).await.unwrap();
        let mut ran = false;

        let result: Result<(), LockError> = lock
            .with_default_lock("k", || {
                ran = true;
                async { Ok(()) }
            })
            .await;

        assert!(matches!(result, Err(LockError::Busy { .. })));
        assert!(!ran);
    }
}
