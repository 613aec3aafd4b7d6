//! Per-run input: one JSON payload per business domain.

use std::collections::BTreeMap;

use common::Payload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SagaError;

/// Domain name → payload sent to that domain's collaborator.
///
/// Immutable once a run starts; steps only read from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SagaContext {
    domains: BTreeMap<String, Payload>,
}

impl SagaContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from a JSON object whose values are all objects.
    pub fn from_value(value: Value) -> Result<Self, SagaError> {
        let Value::Object(map) = value else {
            return Err(SagaError::InvalidContext(
                "expected an object of domain payloads".to_string(),
            ));
        };

        let mut context = Self::new();
        for (domain, payload) in map {
            match payload {
                Value::Object(payload) => context.insert(domain, payload),
                _ => {
                    return Err(SagaError::InvalidContext(format!(
                        "payload for '{domain}' must be an object"
                    )));
                }
            }
        }
        Ok(context)
    }

    pub fn with_domain(mut self, domain: impl Into<String>, payload: Payload) -> Self {
        self.insert(domain, payload);
        self
    }

    pub fn insert(&mut self, domain: impl Into<String>, payload: Payload) {
        self.domains.insert(domain.into(), payload);
    }

    pub fn domain(&self, domain: &str) -> Option<&Payload> {
        self.domains.get(domain)
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
