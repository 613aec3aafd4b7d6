//! Saga coordinator for orchestrating multi-step sagas.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use common::SagaId;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::context::SagaContext;
use crate::error::{SagaError, StepError};
use crate::preflight::{PreflightCheck, PreflightVerdict};
use crate::result::{ResultBuilder, TerminalOutcome};
use crate::run::{CompensationRecord, SagaRun};
use crate::state::SagaState;
use crate::step::{Executed, Step};

/// Drives steps in order and undoes completed ones in reverse on failure.
///
/// Every call to [`SagaCoordinator::run`] owns its own [`SagaRun`]; nothing
/// is shared between concurrent runs.
#[derive(Clone, Default)]
pub struct SagaCoordinator {
    preflight: Option<Arc<dyn PreflightCheck>>,
    deadline: Option<Duration>,
}

impl SagaCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `check` before the first step.
    pub fn with_preflight(mut self, check: Arc<dyn PreflightCheck>) -> Self {
        self.preflight = Some(check);
        self
    }

    /// Bounds the forward phase of every run. Compensation is not bounded.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Executes `steps` against `context`.
    ///
    /// Cancelling `cancel` stops the forward phase at the current step;
    /// compensation of completed steps still runs to the end.
    #[tracing::instrument(skip_all, fields(saga_id = tracing::field::Empty, steps = steps.len()))]
    pub async fn run(
        &self,
        context: &SagaContext,
        steps: &[Arc<dyn Step>],
        cancel: &CancellationToken,
    ) -> SagaRun {
        metrics::counter!("saga_executions_total").increment(1);
        let started = std::time::Instant::now();
        let saga_id = SagaId::new();
        tracing::Span::current().record("saga_id", tracing::field::display(saga_id));

        let mut run = SagaRun::new(saga_id);
        let deadline = self.deadline.map(|d| Instant::now() + d);

        if let Some(check) = &self.preflight {
            match bounded(check.check(context), cancel, deadline).await {
                Ok(PreflightVerdict::Proceed) => {}
                Ok(PreflightVerdict::Reject(reason)) => {
                    tracing::info!(%reason, "saga rejected by pre-flight check");
                    run.state = SagaState::Rejected;
                    run.result = ResultBuilder::build(TerminalOutcome::Rejected { reason: &reason });
                    metrics::counter!("saga_rejected").increment(1);
                    run.finish();
                    record_duration(started);
                    return run;
                }
                Err(source) => {
                    tracing::error!(error = %source, "pre-flight check failed");
                    self.fail(&mut run, 0, SagaError::Preflight(source), steps, context)
                        .await;
                    run.finish();
                    record_duration(started);
                    return run;
                }
            }
        }

        for (index, step) in steps.iter().enumerate() {
            debug_assert!(run.state.can_advance_to(index));
            run.state = SagaState::Running { step: index };
            tracing::info!(step = step.name(), index, "saga step started");

            match bounded(step.execute(context), cancel, deadline).await {
                Ok(Executed {
                    locator,
                    resource_id,
                    ..
                }) => {
                    tracing::info!(step = step.name(), resource_id = ?resource_id, "saga step completed");
                    run.locators.push(locator);
                    run.resource_ids.push(resource_id);
                }
                Err(source) => {
                    tracing::warn!(step = step.name(), error = %source, "saga step failed");
                    let failure = SagaError::StepFailed {
                        step: step.name().to_string(),
                        source,
                    };
                    self.fail(&mut run, index, failure, steps, context).await;
                    run.finish();
                    record_duration(started);
                    return run;
                }
            }
        }

        run.state = SagaState::Succeeded;
        run.result = ResultBuilder::build(TerminalOutcome::Succeeded {
            resource_ids: &run.resource_ids,
        });

        run.finish();
        let duration = record_duration(started);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(%saga_id, duration, "saga completed successfully");
        run
    }

    /// Compensates everything before `failed` and records the failure.
    async fn fail(
        &self,
        run: &mut SagaRun,
        failed: usize,
        failure: SagaError,
        steps: &[Arc<dyn Step>],
        context: &SagaContext,
    ) {
        self.compensate(run, failed, steps, context).await;

        metrics::counter!("saga_failed").increment(1);
        tracing::warn!(saga_id = %run.saga_id, state = %run.state, reason = %failure, "saga failed");
        run.result = ResultBuilder::build(TerminalOutcome::Failed { error: &failure });
        run.failure = Some(failure);
    }

    #[tracing::instrument(skip(self, run, steps, context))]
    async fn compensate(
        &self,
        run: &mut SagaRun,
        failed: usize,
        steps: &[Arc<dyn Step>],
        context: &SagaContext,
    ) {
        debug_assert!(run.state.can_compensate());
        run.state = SagaState::Compensating { failed };

        let completed = run.resource_ids.len().min(failed);
        let mut all_compensated = true;

        for index in (0..completed).rev() {
            let step = &steps[index];
            let Some(resource_id) = run.resource_ids[index].clone() else {
                tracing::warn!(step = step.name(), "no identifier recorded, skipping compensation");
                continue;
            };
            let locator = run.locators[index].clone();

            tracing::info!(step = step.name(), %resource_id, "compensating step");
            let error = match step.compensate(&locator, &resource_id, context).await {
                Ok(()) => None,
                Err(source) => {
                    all_compensated = false;
                    let err = SagaError::CompensationFailed {
                        step: step.name().to_string(),
                        source,
                    };
                    metrics::counter!("saga_compensation_failures_total").increment(1);
                    tracing::error!(
                        alert = true,
                        saga_id = %run.saga_id,
                        step = step.name(),
                        %resource_id,
                        error = %err,
                        "compensation failed, manual reconciliation required"
                    );
                    Some(err.to_string())
                }
            };

            run.compensations.push(CompensationRecord {
                step: step.name().to_string(),
                index,
                resource_id,
                error,
            });
        }

        run.state = if all_compensated {
            SagaState::Compensated
        } else {
            SagaState::CompensationFailed
        };
    }
}

/// Races forward-phase work against cancellation and the run deadline.
async fn bounded<T>(
    work: impl Future<Output = Result<T, StepError>>,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
) -> Result<T, StepError> {
    if cancel.is_cancelled() {
        return Err(StepError::Cancelled);
    }

    let limited = async {
        match deadline {
            Some(at) => match tokio::time::timeout_at(at, work).await {
                Ok(result) => result,
                Err(_) => Err(StepError::DeadlineExceeded),
            },
            None => work.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StepError::Cancelled),
        result = limited => result,
    }
}

fn record_duration(started: std::time::Instant) -> f64 {
    let duration = started.elapsed().as_secs_f64();
    metrics::histogram!("saga_duration_seconds").record(duration);
    duration
}
