//! Dataset metadata handler.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
    Json,
};
use zarr_dataset::DatasetSummary;

use crate::error::ApiError;
use crate::metrics::RequestTimer;
use crate::state::AppState;

use super::store_path;

/// GET /metadata/:bucket/*zarr_path
pub async fn metadata_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((bucket, zarr_path)): Path<(String, String)>,
) -> Response {
    let timer = RequestTimer::start("metadata");

    let response = match summarize(state, bucket, zarr_path).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => e.into_response(),
    };

    timer.finish(response.status());
    response
}

async fn summarize(
    state: Arc<AppState>,
    bucket: String,
    zarr_path: String,
) -> Result<DatasetSummary, ApiError> {
    let path = store_path(&zarr_path).to_string();
    tracing::debug!(bucket = %bucket, path = %path, "Metadata query");

    let source = state.source.clone();
    let summary = tokio::task::spawn_blocking(move || source.open(&bucket, &path)?.summary())
        .await??;

    Ok(summary)
}
