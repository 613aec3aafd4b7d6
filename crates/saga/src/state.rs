//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of a saga run.
///
/// State transitions:
/// ```text
/// Pending ──► Running(i) ──┬──► Succeeded
///    │                     └──► Compensating(i) ──┬──► Compensated
///    │                                            └──► CompensationFailed
///    └──► Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// No step has started yet.
    #[default]
    Pending,

    /// Step `step` is executing.
    Running { step: usize },

    /// Every step succeeded (terminal state).
    Succeeded,

    /// The pre-flight check refused the run; no step ran (terminal state).
    Rejected,

    /// Step `failed` failed; earlier steps are being undone.
    Compensating { failed: usize },

    /// Every attempted compensation succeeded (terminal state).
    Compensated,

    /// At least one compensation failed and needs manual reconciliation
    /// (terminal state).
    CompensationFailed,
}

impl SagaState {
    /// Returns true if the run can move to `Running(step)`.
    pub fn can_advance_to(&self, step: usize) -> bool {
        match self {
            SagaState::Pending => step == 0,
            SagaState::Running { step: current } => step == current + 1,
            _ => false,
        }
    }

    /// Returns true if the saga can begin compensation.
    pub fn can_compensate(&self) -> bool {
        matches!(self, SagaState::Pending | SagaState::Running { .. })
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaState::Succeeded
                | SagaState::Rejected
                | SagaState::Compensated
                | SagaState::CompensationFailed
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Pending => "Pending",
            SagaState::Running { .. } => "Running",
            SagaState::Succeeded => "Succeeded",
            SagaState::Rejected => "Rejected",
            SagaState::Compensating { .. } => "Compensating",
            SagaState::Compensated => "Compensated",
            SagaState::CompensationFailed => "CompensationFailed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SagaState::Running { step } => write!(f, "Running({step})"),
            SagaState::Compensating { failed } => write!(f, "Compensating({failed})"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}
