//! Shared application state.

use std::sync::Arc;

use inventory::{InMemoryCache, InMemoryStockRepository, StockService};
use lease::{DistributedLock, InMemoryLockStore};
use remote::{HttpRemoteCaller, RemoteCaller, RemoteError};
use saga::{SagaCoordinator, Step, purchase_steps, stock_preflight};

use crate::config::Config;

/// Stock service backed by the in-memory stores.
pub type Stocks = StockService<InMemoryStockRepository, InMemoryCache, InMemoryLockStore>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub coordinator: SagaCoordinator,
    pub steps: Vec<Arc<dyn Step>>,
    pub stocks: Stocks,
}

/// Wires the purchase saga and stock service around `caller`.
pub fn create_state(config: &Config, caller: Arc<dyn RemoteCaller>) -> Arc<AppState> {
    let endpoints = config.endpoints();

    let mut coordinator = SagaCoordinator::new();
    if config.preflight_enabled {
        coordinator =
            coordinator.with_preflight(Arc::new(stock_preflight(&endpoints, caller.clone())));
    }
    if let Some(deadline) = config.saga_deadline {
        coordinator = coordinator.with_deadline(deadline);
    }

    let stocks = StockService::new(
        InMemoryStockRepository::new(),
        InMemoryCache::new(),
        DistributedLock::with_ttl(InMemoryLockStore::new(), config.lock_ttl),
    )
    .with_cache_ttl(config.cache_ttl);

    Arc::new(AppState {
        coordinator,
        steps: purchase_steps(&endpoints, caller),
        stocks,
    })
}

/// Creates the default application state talking to collaborators over HTTP.
pub fn create_default_state(config: &Config) -> Result<Arc<AppState>, RemoteError> {
    let caller = HttpRemoteCaller::new(config.retry_policy())?;
    Ok(create_state(config, Arc::new(caller)))
}
