//! Stock endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::Envelope;
use inventory::{NewStock, StockError, StockUpdate};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult = Result<(StatusCode, Json<Envelope>), ApiError>;

/// Body of reserve and restore requests. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct StockMovement {
    pub product_id: u64,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

fn respond(status: StatusCode, message: &str, data: impl serde::Serialize) -> ApiResult {
    let data = serde_json::to_value(data).map_err(|e| ApiError::Internal(e.to_string()))?;
    let envelope = Envelope::new(status.as_u16())
        .with_message(message)
        .with_data(data);
    Ok((status, Json(envelope)))
}

/// GET /stocks
pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult {
    let stocks = state.stocks.all().await?;
    respond(StatusCode::OK, "Stocks retrieved", stocks)
}

/// GET /stocks/{id}
pub async fn get(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> ApiResult {
    let stock = state
        .stocks
        .find(id)
        .await?
        .ok_or(ApiError::Stock(StockError::NotFound(id)))?;
    respond(StatusCode::OK, "Stock retrieved", stock)
}

/// POST /stocks
#[tracing::instrument(skip(state, body))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewStock>, JsonRejection>,
) -> ApiResult {
    let Json(new_stock) = body?;
    let stock = state.stocks.add(new_stock).await?;
    respond(StatusCode::CREATED, "Stock created", stock)
}

/// PUT /stocks/{id}
#[tracing::instrument(skip(state, body))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    body: Result<Json<StockUpdate>, JsonRejection>,
) -> ApiResult {
    let Json(update) = body?;
    let stock = state.stocks.update(id, update).await?;
    respond(StatusCode::OK, "Stock updated", stock)
}

/// DELETE /stocks/{id}
#[tracing::instrument(skip(state))]
pub async fn delete(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> ApiResult {
    if !state.stocks.delete(id).await? {
        return Err(StockError::NotFound(id).into());
    }
    respond(StatusCode::OK, "Stock deleted", serde_json::json!({ "id": id }))
}

/// POST /stocks/reserve: takes units out for a purchase.
#[tracing::instrument(skip(state, body))]
pub async fn reserve(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StockMovement>, JsonRejection>,
) -> ApiResult {
    let Json(movement) = body?;
    let stock = state
        .stocks
        .reserve(movement.product_id, movement.quantity)
        .await?;
    respond(StatusCode::OK, "Stock reserved", stock)
}

/// POST /stocks/restore: puts reserved units back.
#[tracing::instrument(skip(state, body))]
pub async fn restore(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StockMovement>, JsonRejection>,
) -> ApiResult {
    let Json(movement) = body?;
    let stock = state
        .stocks
        .restore(movement.product_id, movement.quantity)
        .await?;
    respond(StatusCode::OK, "Stock restored", stock)
}
