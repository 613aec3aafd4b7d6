//! Saga orchestration for multi-service purchases.
//!
//! A saga runs a fixed list of [`Step`]s in order. Each step calls one
//! collaborator; if any step fails, the steps that already succeeded are
//! compensated in reverse order and the run ends with a failure result.
//!
//! The purchase saga follows these steps:
//! 1. Process payment
//! 2. Create purchase record
//! 3. Reserve stock

pub mod context;
pub mod coordinator;
pub mod error;
pub mod preflight;
pub mod purchase;
pub mod result;
pub mod run;
pub mod state;
pub mod step;

pub use context::SagaContext;
pub use coordinator::SagaCoordinator;
pub use error::{SagaError, StepError};
pub use preflight::{PreflightCheck, PreflightVerdict, StockAvailabilityCheck};
pub use purchase::{Endpoints, purchase_steps, stock_preflight};
pub use result::{ResultBuilder, SagaResult, TerminalOutcome};
pub use run::{CompensationRecord, SagaRun};
pub use state::SagaState;
pub use step::{Compensation, Executed, HttpStep, Step, extract_resource_id};
