//! Stock service: cache-aside reads and lease-guarded writes.

use std::time::Duration;

use lease::{DistributedLock, LockStore};
use serde_json::Value;

use crate::cache::Cache;
use crate::error::{Result, StockError};
use crate::repository::StockRepository;
use crate::stock::{NewStock, Stock, StockUpdate};

/// Default lifetime of cached stock records.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

const LIST_KEY: &str = "stocks";

fn record_key(id: u64) -> String {
    format!("stock_{id}")
}

fn lock_key(id: u64) -> String {
    format!("stock_lock_{id}")
}

/// Manages stock records shared by concurrent requests.
///
/// Writes to a record are serialized through a lease on `stock_lock_{id}`;
/// a concurrent writer gets [`StockError::Lock`] (busy) instead of waiting.
pub struct StockService<R, C, L> {
    repository: R,
    cache: C,
    lock: DistributedLock<L>,
    cache_ttl: Duration,
}

impl<R, C, L> StockService<R, C, L>
where
    R: StockRepository,
    C: Cache,
    L: LockStore + 'static,
{
    /// Creates a stock service with [`DEFAULT_CACHE_TTL`].
    pub fn new(repository: R, cache: C, lock: DistributedLock<L>) -> Self {
        Self {
            repository,
            cache,
            lock,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn lock(&self) -> &DistributedLock<L> {
        &self.lock
    }

    /// Looks a record up in the cache, falling back to the repository.
    #[tracing::instrument(skip(self))]
    pub async fn find(&self, id: u64) -> Result<Option<Stock>> {
        let key = record_key(id);
        if let Some(cached) = self.cache.get(&key).await {
            metrics::counter!("stock_cache_hits_total").increment(1);
            return Ok(Some(serde_json::from_value(cached)?));
        }

        metrics::counter!("stock_cache_misses_total").increment(1);
        let stock = self.repository.get(id).await?;
        if let Some(stock) = &stock {
            self.cache
                .set(&key, serde_json::to_value(stock)?, self.cache_ttl)
                .await;
        }
        Ok(stock)
    }

    /// Lists every record, cached under a single list key.
    pub async fn all(&self) -> Result<Vec<Stock>> {
        if let Some(cached) = self.cache.get(LIST_KEY).await {
            return Ok(serde_json::from_value(cached)?);
        }

        let stocks = self.repository.all().await?;
        if !stocks.is_empty() {
            self.cache
                .set(LIST_KEY, serde_json::to_value(&stocks)?, self.cache_ttl)
                .await;
        }
        Ok(stocks)
    }

    /// Creates a new record.
    #[tracing::instrument(skip(self))]
    pub async fn add(&self, stock: NewStock) -> Result<Stock> {
        if stock.quantity < 0 {
            return Err(StockError::InvalidQuantity(stock.quantity));
        }
        let created = self.repository.insert(stock).await?;
        self.refresh(&created).await?;
        tracing::info!(stock_id = created.id, "stock created");
        Ok(created)
    }

    /// Replaces a record's values.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: u64, update: StockUpdate) -> Result<Stock> {
        if update.quantity < 0 {
            return Err(StockError::InvalidQuantity(update.quantity));
        }

        self.lock
            .with_default_lock(&lock_key(id), || async move {
                let mut stock = self.find(id).await?.ok_or(StockError::NotFound(id))?;
                stock.name = update.name;
                stock.quantity = update.quantity;
                stock.price_cents = update.price_cents;

                let saved = self.repository.save(stock).await?;
                self.refresh(&saved).await?;
                Ok(saved)
            })
            .await
    }

    /// Removes a record. Returns whether it existed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<bool> {
        self.lock
            .with_default_lock(&lock_key(id), || async move {
                let deleted = self.repository.delete(id).await?;
                if deleted {
                    self.cache.delete(&record_key(id)).await;
                    self.cache.delete(LIST_KEY).await;
                }
                Ok(deleted)
            })
            .await
    }

    /// Applies a signed change to the quantity; the result may not go negative.
    #[tracing::instrument(skip(self))]
    pub async fn adjust(&self, id: u64, delta: i64) -> Result<Stock> {
        self.lock
            .with_default_lock(&lock_key(id), || async move {
                let mut stock = self.find(id).await?.ok_or(StockError::NotFound(id))?;

                let remaining = stock
                    .quantity
                    .checked_add(delta)
                    .ok_or(StockError::InvalidQuantity(delta))?;
                if remaining < 0 {
                    return Err(StockError::Insufficient {
                        product_id: id,
                        available: stock.quantity,
                        requested: -delta,
                    });
                }

                stock.quantity = remaining;
                let saved = self.repository.save(stock).await?;
                self.refresh(&saved).await?;
                Ok(saved)
            })
            .await
    }

    /// Takes `quantity` units out of stock for a purchase.
    pub async fn reserve(&self, product_id: u64, quantity: i64) -> Result<Stock> {
        if quantity <= 0 {
            return Err(StockError::InvalidQuantity(quantity));
        }
        let stock = self.adjust(product_id, -quantity).await?;
        metrics::counter!("stock_reserved_units_total").increment(quantity as u64);
        tracing::info!(product_id, quantity, remaining = stock.quantity, "stock reserved");
        Ok(stock)
    }

    /// Puts `quantity` units back, undoing a reservation.
    pub async fn restore(&self, product_id: u64, quantity: i64) -> Result<Stock> {
        if quantity <= 0 {
            return Err(StockError::InvalidQuantity(quantity));
        }
        let stock = self.adjust(product_id, quantity).await?;
        tracing::info!(product_id, quantity, remaining = stock.quantity, "stock restored");
        Ok(stock)
    }

    /// Units currently available, or `None` for unknown products.
    pub async fn available(&self, product_id: u64) -> Result<Option<i64>> {
        Ok(self.find(product_id).await?.map(|s| s.quantity))
    }

    async fn refresh(&self, stock: &Stock) -> Result<()> {
        let value: Value = serde_json::to_value(stock)?;
        self.cache
            .set(&record_key(stock.id), value, self.cache_ttl)
            .await;
        self.cache.delete(LIST_KEY).await;
        Ok(())
    }
}
