//! Source of truth for stock records.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::stock::{NewStock, Stock};

/// Persistence port for stock records.
#[async_trait]
pub trait StockRepository: Send + Sync {
    async fn get(&self, id: u64) -> Result<Option<Stock>>;
    async fn all(&self) -> Result<Vec<Stock>>;
    async fn insert(&self, stock: NewStock) -> Result<Stock>;
    async fn save(&self, stock: Stock) -> Result<Stock>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: u64) -> Result<bool>;
}

#[derive(Debug, Default)]
struct RepositoryState {
    records: BTreeMap<u64, Stock>,
    next_id: u64,
}

/// In-memory repository for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockRepository {
    state: Arc<RwLock<RepositoryState>>,
}

impl InMemoryStockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl StockRepository for InMemoryStockRepository {
    async fn get(&self, id: u64) -> Result<Option<Stock>> {
        Ok(self.state.read().await.records.get(&id).cloned())
    }

    async fn all(&self) -> Result<Vec<Stock>> {
        Ok(self.state.read().await.records.values().cloned().collect())
    }

    async fn insert(&self, stock: NewStock) -> Result<Stock> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let record = Stock {
            id: state.next_id,
            name: stock.name,
            quantity: stock.quantity,
            price_cents: stock.price_cents,
        };
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn save(&self, stock: Stock) -> Result<Stock> {
        let mut state = self.state.write().await;
        state.next_id = state.next_id.max(stock.id);
        state.records.insert(stock.id, stock.clone());
        Ok(stock)
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        Ok(self.state.write().await.records.remove(&id).is_some())
    }
}
