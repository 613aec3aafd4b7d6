use serde::{Deserialize, Serialize};

/// Units of one product held in the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: u64,
    pub name: String,
    pub quantity: i64,
    pub price_cents: i64,
}

/// Data for a stock record that has no ID yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStock {
    pub name: String,
    pub quantity: i64,
    pub price_cents: i64,
}

/// Replacement values for an existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub name: String,
    pub quantity: i64,
    pub price_cents: i64,
}
