//! Health check handler.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// GET /health - verifies the dataset source is usable
pub async fn health_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.source.check() {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                detail: None,
            }),
        ),
        Err(e) => {
            tracing::error!(source = state.source.kind(), error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    detail: Some(e.to_string()),
                }),
            )
        }
    }
}
