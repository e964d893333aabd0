//! Request metrics recorded through the `metrics` facade.
//!
//! Without an installed recorder these calls are no-ops.

use std::time::Instant;

use axum::http::StatusCode;
use metrics::{counter, histogram};
use zarr_dataset::{PointQueryResult, VariableValue};

/// Times one request and records it when finished.
pub struct RequestTimer {
    endpoint: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn start(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            start: Instant::now(),
        }
    }

    pub fn finish(self, status: StatusCode) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        counter!(
            "query_api_requests_total",
            "endpoint" => self.endpoint,
            "status" => status.as_u16().to_string()
        )
        .increment(1);
        histogram!("query_api_request_duration_ms", "endpoint" => self.endpoint)
            .record(elapsed_ms);
    }
}

/// Count variables whose extraction failed in a point query.
pub fn record_variable_errors(result: &PointQueryResult) {
    for (name, value) in &result.values {
        if matches!(value, VariableValue::Error(_)) {
            counter!("query_api_variable_errors_total", "variable" => name.clone()).increment(1);
        }
    }
}
