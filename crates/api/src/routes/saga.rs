//! Saga trigger endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use saga::purchase::SAGA_TYPE;
use saga::{SagaContext, SagaResult};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /saga: runs the purchase saga for `{payment, purchase, stock}`.
///
/// The run lives on its own task. If the client goes away the handler is
/// dropped, which cancels the run; compensation of completed steps still
/// finishes on that task.
#[tracing::instrument(skip(state, body), fields(saga_type = SAGA_TYPE))]
pub async fn execute(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<SagaResult>), ApiError> {
    let Json(body) = body?;
    let context = SagaContext::from_value(body)?;

    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let task_state = state.clone();
    let run = tokio::spawn(async move {
        task_state
            .coordinator
            .run(&context, &task_state.steps, &cancel)
            .await
    })
    .await
    .map_err(|e| ApiError::Internal(format!("saga task failed: {e}")))?;
    guard.disarm();

    tracing::info!(saga_id = %run.saga_id(), state = %run.state(), "saga finished");
    let result = run.into_result();
    metrics::counter!("saga_responses_total", "status" => result.status_code.to_string())
        .increment(1);
    let status =
        StatusCode::from_u16(result.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(result)))
}
