//! Query API Service Library
//!
//! HTTP access to Zarr weather datasets: nearest-point extraction and
//! dataset metadata for any `{bucket}/{path}` in the configured source.

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/data/:bucket/*zarr_path", get(handlers::data::data_handler))
        .route(
            "/metadata/:bucket/*zarr_path",
            get(handlers::metadata::metadata_handler),
        )
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::metrics::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
