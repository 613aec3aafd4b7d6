//! Saga steps: a forward action against one collaborator and its undo.

use std::sync::Arc;

use async_trait::async_trait;
use common::ResourceId;
use remote::{Method, RemoteCaller, RemoteOutcome, RemoteRequest};
use serde_json::Value;

use crate::context::SagaContext;
use crate::error::StepError;

/// What a successful step leaves behind for its compensation.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    /// Where the created resource lives.
    pub locator: String,
    /// Identifier assigned by the collaborator; `None` means nothing can be undone.
    pub resource_id: Option<ResourceId>,
    /// The collaborator's decoded response.
    pub response: Value,
}

/// One stage of a saga.
///
/// Implementations hold no per-run state: everything compensation needs comes
/// back in [`Executed`] and is handed to [`Step::compensate`] by the coordinator.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    /// Performs the forward action.
    async fn execute(&self, context: &SagaContext) -> Result<Executed, StepError>;

    /// Undoes a previous successful `execute`. A resource that no longer
    /// exists counts as undone.
    async fn compensate(
        &self,
        locator: &str,
        resource_id: &ResourceId,
        context: &SagaContext,
    ) -> Result<(), StepError>;
}

/// How an [`HttpStep`] undoes its forward action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// `DELETE {locator}/{id}`.
    Delete,
    /// `POST {locator}/{id}/{action}`, e.g. a payment reversal.
    Reverse(String),
    /// `POST {url}` with the step's original payload, e.g. returning stock.
    Return(String),
}

/// A step that POSTs its domain payload to a collaborator.
#[derive(Clone)]
pub struct HttpStep {
    name: String,
    domain: String,
    url: String,
    expected_status: u16,
    id_fallback: Option<String>,
    compensation: Compensation,
    caller: Arc<dyn RemoteCaller>,
}

impl HttpStep {
    /// Creates a step expecting `201 Created`, compensated by `DELETE`.
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        url: impl Into<String>,
        caller: Arc<dyn RemoteCaller>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            url: url.into(),
            expected_status: 201,
            id_fallback: None,
            compensation: Compensation::Delete,
            caller,
        }
    }

    pub fn with_compensation(mut self, compensation: Compensation) -> Self {
        self.compensation = compensation;
        self
    }

    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    /// Field read as the identifier when the response carries no `id`.
    pub fn with_id_fallback(mut self, field: impl Into<String>) -> Self {
        self.id_fallback = Some(field.into());
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn compensation(&self) -> &Compensation {
        &self.compensation
    }

    fn payload(&self, context: &SagaContext) -> Result<Value, StepError> {
        context
            .domain(&self.domain)
            .map(|payload| Value::Object(payload.clone()))
            .ok_or_else(|| StepError::MissingDomain(self.domain.clone()))
    }

    fn compensation_request(
        &self,
        locator: &str,
        resource_id: &ResourceId,
        context: &SagaContext,
    ) -> Result<RemoteRequest, StepError> {
        let locator = locator.trim_end_matches('/');
        let request = match &self.compensation {
            Compensation::Delete => RemoteRequest::delete(format!("{locator}/{resource_id}")),
            Compensation::Reverse(action) => {
                RemoteRequest::new(Method::POST, format!("{locator}/{resource_id}/{action}"))
            }
            Compensation::Return(url) => RemoteRequest::post(url.clone(), self.payload(context)?),
        };
        Ok(request)
    }
}

impl std::fmt::Debug for HttpStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStep")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("url", &self.url)
            .field("compensation", &self.compensation)
            .finish()
    }
}

#[async_trait]
impl Step for HttpStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, context: &SagaContext) -> Result<Executed, StepError> {
        let payload = self.payload(context)?;
        let request = RemoteRequest::post(self.url.clone(), payload).expect(self.expected_status);

        let response = self.caller.call(&request).await.into_result()?;
        let resource_id = extract_resource_id(&response, self.id_fallback.as_deref());
        if resource_id.is_none() {
            tracing::warn!(step = %self.name, "response carries no identifier; step cannot be compensated");
        }

        Ok(Executed {
            locator: self.url.clone(),
            resource_id,
            response,
        })
    }

    async fn compensate(
        &self,
        locator: &str,
        resource_id: &ResourceId,
        context: &SagaContext,
    ) -> Result<(), StepError> {
        let request = self.compensation_request(locator, resource_id, context)?;

        match self.caller.call(&request).await {
            RemoteOutcome::NotFound => {
                tracing::warn!(step = %self.name, %resource_id, "resource already gone; treating as compensated");
                Ok(())
            }
            outcome => outcome.into_result().map(|_| ()).map_err(StepError::from),
        }
    }
}

/// Reads the identifier from `data.id`, else `data.<fallback>`.
///
/// `data` is the body's `data` object when present, otherwise the body itself.
pub fn extract_resource_id(body: &Value, fallback: Option<&str>) -> Option<ResourceId> {
    let data = body.get("data").filter(|d| d.is_object()).unwrap_or(body);

    data.get("id")
        .and_then(ResourceId::from_json)
        .or_else(|| {
            fallback
                .and_then(|field| data.get(field))
                .and_then(ResourceId::from_json)
        })
}
