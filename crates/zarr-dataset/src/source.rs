//! Where datasets are opened from.

use std::path::PathBuf;

use zarrs::storage::ReadableListableStorage;

use crate::config::StorageConfig;
use crate::dataset::Dataset;
use crate::error::{DatasetError, Result};
use crate::storage::{build_s3_client, create_filesystem_storage, create_minio_storage};

/// Opens datasets addressed by `{bucket}/{path}`.
///
/// Implementations are synchronous; async callers run them on the blocking pool.
pub trait DatasetSource: Send + Sync {
    /// Open the dataset stored at `{bucket}/{path}`.
    fn open(&self, bucket: &str, path: &str) -> Result<Dataset>;

    /// Verify the source is usable without touching any particular dataset.
    fn check(&self) -> Result<()>;

    /// Short backend name for logs.
    fn kind(&self) -> &'static str;
}

/// Datasets in S3-compatible object storage.
#[derive(Debug, Clone)]
pub struct ObjectStoreSource {
    config: StorageConfig,
}

impl ObjectStoreSource {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

impl DatasetSource for ObjectStoreSource {
    fn open(&self, bucket: &str, path: &str) -> Result<Dataset> {
        let storage: ReadableListableStorage = create_minio_storage(&self.config, bucket, path)?;
        Dataset::open(storage)
    }

    fn check(&self) -> Result<()> {
        // Client construction validates the endpoint and credentials shape.
        build_s3_client(&self.config, "health-check").map(|_| ())
    }

    fn kind(&self) -> &'static str {
        "object_store"
    }
}

/// Datasets under a local directory, laid out as `<root>/<bucket>/<path>`.
#[derive(Debug, Clone)]
pub struct FilesystemSource {
    root: PathBuf,
}

impl FilesystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DatasetSource for FilesystemSource {
    fn open(&self, bucket: &str, path: &str) -> Result<Dataset> {
        let storage: ReadableListableStorage =
            create_filesystem_storage(&self.root, bucket, path, false)?;
        Dataset::open(storage)
    }

    fn check(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(DatasetError::Config(format!(
                "data directory {} does not exist",
                self.root.display()
            )))
        }
    }

    fn kind(&self) -> &'static str {
        "filesystem"
    }
}
