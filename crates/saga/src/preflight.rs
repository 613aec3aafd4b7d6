//! Checks run before the first step.

use std::sync::Arc;

use async_trait::async_trait;
use common::ResourceId;
use remote::{RemoteCaller, RemoteOutcome, RemoteRequest};
use serde_json::Value;

use crate::context::SagaContext;
use crate::error::StepError;

/// Whether a run may start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreflightVerdict {
    Proceed,
    /// The run is refused; the text is shown to the client.
    Reject(String),
}

/// A read-only check against collaborators before any side effect.
///
/// An `Err` means no verdict could be reached; the run fails without
/// executing any step.
#[async_trait]
pub trait PreflightCheck: Send + Sync {
    async fn check(&self, context: &SagaContext) -> Result<PreflightVerdict, StepError>;
}

/// Refuses a purchase when the catalog does not hold enough stock.
///
/// Advisory only: stock can still run out between this check and the
/// reservation step, which then fails and triggers compensation.
#[derive(Clone)]
pub struct StockAvailabilityCheck {
    caller: Arc<dyn RemoteCaller>,
    catalog_url: String,
    domain: String,
    product_field: String,
    quantity_field: String,
    available_field: String,
}

impl StockAvailabilityCheck {
    pub fn new(catalog_url: impl Into<String>, caller: Arc<dyn RemoteCaller>) -> Self {
        Self {
            caller,
            catalog_url: catalog_url.into(),
            domain: "stock".to_string(),
            product_field: "product_id".to_string(),
            quantity_field: "quantity".to_string(),
            available_field: "stock".to_string(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Field of the catalog record holding the units on hand.
    pub fn with_available_field(mut self, field: impl Into<String>) -> Self {
        self.available_field = field.into();
        self
    }
}

#[async_trait]
impl PreflightCheck for StockAvailabilityCheck {
    #[tracing::instrument(skip_all, fields(domain = %self.domain))]
    async fn check(&self, context: &SagaContext) -> Result<PreflightVerdict, StepError> {
        let payload = context
            .domain(&self.domain)
            .ok_or_else(|| StepError::MissingDomain(self.domain.clone()))?;

        let product_id = payload
            .get(&self.product_field)
            .and_then(ResourceId::from_json)
            .ok_or_else(|| StepError::InvalidPayload(format!("missing {}", self.product_field)))?;
        let requested = match payload.get(&self.quantity_field) {
            None | Some(Value::Null) => 1,
            Some(value) => requested_quantity(value).ok_or_else(|| {
                StepError::InvalidPayload(format!("{} must be an integer", self.quantity_field))
            })?,
        };

        let url = format!("{}/{product_id}", self.catalog_url.trim_end_matches('/'));
        let body = match self.caller.call(&RemoteRequest::get(url).expect(200)).await {
            RemoteOutcome::NotFound => {
                return Ok(PreflightVerdict::Reject(format!("Product {product_id} not found")));
            }
            outcome => outcome.into_result()?,
        };

        let record = body.get("data").filter(|d| d.is_object()).unwrap_or(&body);
        let available = record
            .get(&self.available_field)
            .and_then(Value::as_i64)
            .unwrap_or(0);

        if available >= requested {
            tracing::debug!(%product_id, available, requested, "stock available");
            Ok(PreflightVerdict::Proceed)
        } else {
            tracing::info!(%product_id, available, requested, "insufficient stock");
            Ok(PreflightVerdict::Reject(format!(
                "Insufficient stock for product {product_id}: {available} available, {requested} requested"
            )))
        }
    }
}

/// Reads a quantity sent either as a JSON integer or as a decimal string.
fn requested_quantity(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Payload;
    use remote::Method;
    use remote::testing::ScriptedCaller;
    use serde_json::json;

    fn context(quantity: Option<Value>) -> SagaContext {
        let mut payload = Payload::new();
        payload.insert("product_id".to_string(), json!(3));
        if let Some(quantity) = quantity {
            payload.insert("quantity".to_string(), json!(quantity));
        }
        SagaContext::new().with_domain("stock", payload)
    }

    fn check_with(outcome: RemoteOutcome) -> StockAvailabilityCheck {
        let caller = ScriptedCaller::new();
        caller.on(Method::GET, "http://catalog/products/3", outcome);
        StockAvailabilityCheck::new("http://catalog/products", Arc::new(caller))
    }

    #[tokio::test]
    async fn test_proceeds_when_enough_stock() {
        let check = check_with(RemoteOutcome::Success(json!({"data": {"stock": 5}})));
        assert_eq!(
            check.check(&context(Some(json!(5)))).await.unwrap(),
            PreflightVerdict::Proceed
        );
    }

    #[tokio::test]
    async fn test_rejects_when_short() {
        let check = check_with(RemoteOutcome::Success(json!({"stock": 1})));
        let verdict = check.check(&context(Some(json!(2)))).await.unwrap();
        assert!(matches!(verdict, PreflightVerdict::Reject(reason) if reason.contains("Insufficient stock")));
    }

    #[tokio::test]
    async fn test_quantity_defaults_to_one() {
        let check = check_with(RemoteOutcome::Success(json!({"stock": 1})));
        assert_eq!(
            check.check(&context(None)).await.unwrap(),
            PreflightVerdict::Proceed
        );
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let check = check_with(RemoteOutcome::NotFound);
        assert!(matches!(
            check.check(&context(Some(json!(1)))).await.unwrap(),
            PreflightVerdict::Reject(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_catalog_is_error() {
        let check = check_with(RemoteOutcome::TransientNetworkFailure("refused".to_string()));
        assert!(matches!(
            check.check(&context(Some(json!(1)))).await,
            Err(StepError::Remote(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_product_is_error() {
        let check = check_with(RemoteOutcome::NotFound);
        let context = SagaContext::new().with_domain("stock", Payload::new());
        assert!(matches!(
            check.check(&context).await,
            Err(StepError::InvalidPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_string_quantity_is_honoured() {
        let check = check_with(RemoteOutcome::Success(json!({"stock": 1})));
        let verdict = check.check(&context(Some(json!("2")))).await.unwrap();
        assert!(matches!(verdict, PreflightVerdict::Reject(reason) if reason.contains("2 requested")));
    }

    #[tokio::test]
    async fn test_non_numeric_quantity_is_error() {
        let check = check_with(RemoteOutcome::Success(json!({"stock": 10})));
        for quantity in [json!("abc"), json!(1.5), json!([2])] {
            assert!(matches!(
                check.check(&context(Some(quantity))).await,
                Err(StepError::InvalidPayload(_))
            ));
        }
    }
}
