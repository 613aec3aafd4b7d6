//! Record of one saga execution.

use chrono::{DateTime, Utc};
use common::{ResourceId, SagaId};

use crate::error::SagaError;
use crate::result::SagaResult;
use crate::state::SagaState;

/// Outcome of one attempted compensation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompensationRecord {
    pub step: String,
    pub index: usize,
    pub resource_id: ResourceId,
    /// `None` when the compensation succeeded.
    pub error: Option<String>,
}

impl CompensationRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything known about a run once it reaches a terminal state.
#[derive(Debug, Clone)]
pub struct SagaRun {
    pub(crate) saga_id: SagaId,
    pub(crate) state: SagaState,
    pub(crate) resource_ids: Vec<Option<ResourceId>>,
    pub(crate) locators: Vec<String>,
    pub(crate) compensations: Vec<CompensationRecord>,
    pub(crate) failure: Option<SagaError>,
    pub(crate) result: SagaResult,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
}

impl SagaRun {
    pub(crate) fn new(saga_id: SagaId) -> Self {
        Self {
            saga_id,
            state: SagaState::Pending,
            resource_ids: Vec::new(),
            locators: Vec::new(),
            compensations: Vec::new(),
            failure: None,
            result: SagaResult::new(500),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Stamps the end of the run.
    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn saga_id(&self) -> SagaId {
        self.saga_id
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Identifiers of the steps that succeeded, in execution order.
    pub fn resource_ids(&self) -> &[Option<ResourceId>] {
        &self.resource_ids
    }

    /// Number of steps that succeeded.
    pub fn completed_steps(&self) -> usize {
        self.resource_ids.len()
    }

    /// Attempted compensations, in the order they ran.
    pub fn compensations(&self) -> &[CompensationRecord] {
        &self.compensations
    }

    /// The error that ended the run, if it did not succeed.
    pub fn failure(&self) -> Option<&SagaError> {
        self.failure.as_ref()
    }

    pub fn result(&self) -> &SagaResult {
        &self.result
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Set once the run reaches a terminal state.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn into_result(self) -> SagaResult {
        self.result
    }
}
