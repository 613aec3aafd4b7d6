//! HTTP API server for the purchase saga and the stock service.
//!
//! Provides the saga trigger and stock endpoints, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use state::{AppState, create_default_state, create_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/saga", post(routes::saga::execute))
        .route("/stocks", get(routes::stocks::list).post(routes::stocks::create))
        .route("/stocks/reserve", post(routes::stocks::reserve))
        .route("/stocks/restore", post(routes::stocks::restore))
        .route(
            "/stocks/{id}",
            get(routes::stocks::get)
                .put(routes::stocks::update)
                .delete(routes::stocks::delete),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
