//! Application state for the Query API.

use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use zarr_dataset::{DatasetSource, FilesystemSource, ObjectStoreSource, StorageConfig};

/// Shared application state.
pub struct AppState {
    /// Where datasets are opened from; every request opens its own store.
    pub source: Arc<dyn DatasetSource>,

    /// Prometheus handle for `/metrics`, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        Self {
            source,
            metrics: None,
        }
    }

    /// Serve from `data_dir` when given, otherwise from object storage
    /// configured by the `S3_*` environment variables.
    pub fn from_config(data_dir: Option<PathBuf>) -> Self {
        let source: Arc<dyn DatasetSource> = match data_dir {
            Some(dir) => Arc::new(FilesystemSource::new(dir)),
            None => Arc::new(ObjectStoreSource::new(StorageConfig::from_env())),
        };
        Self::new(source)
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
