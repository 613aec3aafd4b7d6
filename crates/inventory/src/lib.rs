//! Inventory stock service.
//!
//! Reads go through a cache-aside layer; every mutation runs inside a lease
//! on the stock record covering read, validation, write and cache refresh.

pub mod cache;
pub mod error;
pub mod repository;
pub mod service;
pub mod stock;

pub use cache::{Cache, InMemoryCache};
pub use error::{Result, StockError};
pub use repository::{InMemoryStockRepository, StockRepository};
pub use service::{DEFAULT_CACHE_TTL, StockService};
pub use stock::{NewStock, Stock, StockUpdate};
