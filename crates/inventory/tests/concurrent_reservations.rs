//! Concurrent reservations against a single stock record.

use std::sync::Arc;

use futures_util::future::join_all;
use inventory::{InMemoryCache, InMemoryStockRepository, NewStock, StockError, StockService};
use lease::{DistributedLock, InMemoryLockStore};

type Service = StockService<InMemoryStockRepository, InMemoryCache, InMemoryLockStore>;

fn service() -> Arc<Service> {
    Arc::new(StockService::new(
        InMemoryStockRepository::new(),
        InMemoryCache::new(),
        DistributedLock::new(InMemoryLockStore::new()),
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_lost_updates_under_contention() {
    let service = service();
    let stock = service
        .add(NewStock {
            name: "Widget".to_string(),
            quantity: 100,
            price_cents: 500,
        })
        .await
        .unwrap();

    let tasks = (0..20).map(|_| {
        let service = service.clone();
        tokio::spawn(async move {
            // Busy is retryable: keep trying until the lease is ours.
            loop {
                match service.reserve(stock.id, 3).await {
                    Ok(_) => return,
                    Err(e) if e.is_busy() => tokio::task::yield_now().await,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
        })
    });

    for task in join_all(tasks).await {
        task.unwrap();
    }

    assert_eq!(service.available(stock.id).await.unwrap(), Some(40));
    assert_eq!(service.lock().store().live_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_never_oversells() {
    let service = service();
    let stock = service
        .add(NewStock {
            name: "Gadget".to_string(),
            quantity: 5,
            price_cents: 2500,
        })
        .await
        .unwrap();

    let tasks = (0..12).map(|_| {
        let service = service.clone();
        tokio::spawn(async move {
            loop {
                match service.reserve(stock.id, 1).await {
                    Ok(_) => return true,
                    Err(StockError::Insufficient { .. }) => return false,
                    Err(e) if e.is_busy() => tokio::task::yield_now().await,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
        })
    });

    let sold = join_all(tasks)
        .await
        .into_iter()
        .filter(|r| *r.as_ref().unwrap())
        .count();

    assert_eq!(sold, 5);
    assert_eq!(service.available(stock.id).await.unwrap(), Some(0));
}
