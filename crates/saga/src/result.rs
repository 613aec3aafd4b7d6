//! Maps a finished run to the envelope returned to the client.

use common::{Envelope, ResourceId};
use serde_json::json;

use crate::error::SagaError;

/// The client-facing result of a run.
pub type SagaResult = Envelope;

pub const SUCCESS_MESSAGE: &str = "OK";
pub const SUCCESS_DETAIL: &str = "Operation completed successfully";
pub const FAILURE_MESSAGE: &str = "Error during saga execution";

/// How a run ended, as far as the client is concerned.
#[derive(Debug, Clone, Copy)]
pub enum TerminalOutcome<'a> {
    Succeeded { resource_ids: &'a [Option<ResourceId>] },
    Rejected { reason: &'a str },
    Failed { error: &'a SagaError },
}

/// Builds [`SagaResult`]s. Error text only ever lands in `data.error`.
pub struct ResultBuilder;

impl ResultBuilder {
    pub fn build(outcome: TerminalOutcome<'_>) -> SagaResult {
        match outcome {
            TerminalOutcome::Succeeded { resource_ids } => Envelope::new(201)
                .with_message(SUCCESS_MESSAGE)
                .with_data(json!({
                    "message": SUCCESS_DETAIL,
                    "resource_ids": resource_ids,
                })),
            TerminalOutcome::Rejected { reason } => Envelope::new(409)
                .with_message(reason)
                .with_data(json!({ "reason": reason })),
            TerminalOutcome::Failed { error } => Envelope::error(500, FAILURE_MESSAGE, error),
        }
    }
}
