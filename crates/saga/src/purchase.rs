//! Purchase saga definition.
//!
//! Step 1: Process payment
//! Step 2: Create purchase record
//! Step 3: Reserve stock
//!
//! If any step fails, previously completed steps are compensated in reverse
//! order: the purchase is deleted, the payment reversed.

use std::sync::Arc;

use remote::RemoteCaller;

use crate::preflight::StockAvailabilityCheck;
use crate::step::{Compensation, HttpStep, Step};

/// Saga type identifier.
pub const SAGA_TYPE: &str = "Purchase";

pub const DOMAIN_PAYMENT: &str = "payment";
pub const DOMAIN_PURCHASE: &str = "purchase";
pub const DOMAIN_STOCK: &str = "stock";

/// Step name: process payment.
pub const STEP_PROCESS_PAYMENT: &str = "process_payment";

/// Step name: create purchase record.
pub const STEP_CREATE_PURCHASE: &str = "create_purchase";

/// Step name: reserve stock.
pub const STEP_RESERVE_STOCK: &str = "reserve_stock";

/// Action appended to a payment's URL to reverse it.
pub const PAYMENT_REVERSAL_ACTION: &str = "compensation";

/// Base URLs of the collaborators taking part in a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub payments: String,
    pub purchases: String,
    pub stock: String,
    pub catalog: String,
}

impl Endpoints {
    fn stock_url(&self, path: &str) -> String {
        format!("{}/{path}", self.stock.trim_end_matches('/'))
    }
}

/// Builds the three purchase steps in execution order.
pub fn purchase_steps(endpoints: &Endpoints, caller: Arc<dyn RemoteCaller>) -> Vec<Arc<dyn Step>> {
    let payment = HttpStep::new(
        STEP_PROCESS_PAYMENT,
        DOMAIN_PAYMENT,
        endpoints.payments.trim_end_matches('/'),
        caller.clone(),
    )
    .with_compensation(Compensation::Reverse(PAYMENT_REVERSAL_ACTION.to_string()));

    let purchase = HttpStep::new(
        STEP_CREATE_PURCHASE,
        DOMAIN_PURCHASE,
        endpoints.purchases.trim_end_matches('/'),
        caller.clone(),
    );

    let stock = HttpStep::new(
        STEP_RESERVE_STOCK,
        DOMAIN_STOCK,
        endpoints.stock_url("reserve"),
        caller,
    )
    .with_expected_status(200)
    .with_id_fallback("product_id")
    .with_compensation(Compensation::Return(endpoints.stock_url("restore")));

    vec![Arc::new(payment), Arc::new(purchase), Arc::new(stock)]
}

/// Builds the advisory stock check run before a purchase.
pub fn stock_preflight(endpoints: &Endpoints, caller: Arc<dyn RemoteCaller>) -> StockAvailabilityCheck {
    StockAvailabilityCheck::new(endpoints.catalog.clone(), caller).with_domain(DOMAIN_STOCK)
}
