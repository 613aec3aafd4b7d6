//! Saga error types.

use remote::RemoteError;
use thiserror::Error;

/// Why a single step (or its compensation) did not succeed.
#[derive(Debug, Clone, Error)]
pub enum StepError {
    /// The collaborator answered with a failure or could not be reached.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The saga context has no payload for the step's domain.
    #[error("Missing payload for domain '{0}'")]
    MissingDomain(String),

    /// The domain payload is present but unusable.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The run was cancelled before the step finished.
    #[error("Saga run was cancelled")]
    Cancelled,

    /// The run deadline elapsed before the step finished.
    #[error("Saga deadline exceeded")]
    DeadlineExceeded,
}

/// Errors that end a saga run.
#[derive(Debug, Clone, Error)]
pub enum SagaError {
    /// A saga step failed.
    #[error("Saga step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: StepError,
    },

    /// A compensation step failed.
    #[error("Compensation step '{step}' failed: {source}")]
    CompensationFailed {
        step: String,
        #[source]
        source: StepError,
    },

    /// The pre-flight check could not reach a verdict.
    #[error("Pre-flight check failed: {0}")]
    Preflight(#[source] StepError),

    /// The request body is not a map of domain payloads.
    #[error("Invalid saga context: {0}")]
    InvalidContext(String),
}
