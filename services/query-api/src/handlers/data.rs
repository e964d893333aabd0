//! Point query handler.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use zarr_dataset::{PointQuery, PointQueryResult};

use crate::error::ApiError;
use crate::metrics::{record_variable_errors, RequestTimer};
use crate::state::AppState;

use super::store_path;

/// Query parameters for the data endpoint.
#[derive(Debug, Deserialize)]
pub struct DataQueryParams {
    /// Latitude in degrees. Required.
    pub lat: f64,

    /// Longitude in degrees. Required.
    pub lon: f64,

    /// Comma-separated variable names; all variables when absent.
    pub variables: Option<String>,

    /// Date or datetime to select; the full time series when absent.
    pub time: Option<String>,
}

impl DataQueryParams {
    fn into_point_query(self) -> Result<PointQuery, ApiError> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(ApiError::BadRequest(
                "lat and lon must be finite numbers".to_string(),
            ));
        }

        let mut query = PointQuery::new(self.lat, self.lon);
        if let Some(list) = self.variables.as_deref() {
            query = query.with_variable_list(list);
        }
        if let Some(time) = self.time {
            query = query.with_time(time);
        }
        Ok(query)
    }
}

/// GET /data/:bucket/*zarr_path
pub async fn data_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((bucket, zarr_path)): Path<(String, String)>,
    params: Result<Query<DataQueryParams>, QueryRejection>,
) -> Response {
    let timer = RequestTimer::start("data");

    let response = match point_query(state, bucket, zarr_path, params).await {
        Ok(result) => {
            record_variable_errors(&result);
            Json(result).into_response()
        }
        Err(e) => e.into_response(),
    };

    timer.finish(response.status());
    response
}

async fn point_query(
    state: Arc<AppState>,
    bucket: String,
    zarr_path: String,
    params: Result<Query<DataQueryParams>, QueryRejection>,
) -> Result<PointQueryResult, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = params.into_point_query()?;
    let path = store_path(&zarr_path).to_string();

    tracing::debug!(
        bucket = %bucket,
        path = %path,
        lat = query.latitude,
        lon = query.longitude,
        variables = ?query.variables,
        time = ?query.time,
        "Point query"
    );

    let source = state.source.clone();
    let result = tokio::task::spawn_blocking(move || {
        let dataset = source.open(&bucket, &path)?;
        dataset.query_point(&query)
    })
    .await??;

    Ok(result)
}
