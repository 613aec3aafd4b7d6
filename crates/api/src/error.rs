//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::Envelope;
use inventory::StockError;
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
///
/// Every variant renders as an [`Envelope`] with the detail in `data.error`.
#[derive(Debug)]
pub enum ApiError {
    /// Well-formed request with unusable content.
    Unprocessable(String),
    /// Stock or inventory domain error.
    Stock(StockError),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Stock(err) => stock_error_status(err),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Unprocessable(msg) => msg,
            ApiError::Stock(err) => err.to_string(),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                msg
            }
        };

        let message = status.canonical_reason().unwrap_or("Error");
        let body = Envelope::error(status.as_u16(), message, detail);
        (status, axum::Json(body)).into_response()
    }
}

fn stock_error_status(err: &StockError) -> StatusCode {
    match err {
        StockError::NotFound(_) => StatusCode::NOT_FOUND,
        StockError::Insufficient { .. } => StatusCode::CONFLICT,
        StockError::InvalidQuantity(_) => StatusCode::UNPROCESSABLE_ENTITY,
        err if err.is_busy() => StatusCode::LOCKED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        ApiError::Stock(err)
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        match err {
            SagaError::InvalidContext(msg) => ApiError::Unprocessable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}
