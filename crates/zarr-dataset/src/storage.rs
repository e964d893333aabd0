//! Object store and filesystem backends for Zarr access.
//!
//! Stores are addressed by a bucket plus a path prefix inside it. Helpers here
//! build the object_store client for a location and wrap it for the
//! synchronous zarrs API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::TryStreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::prefix::PrefixStore;
use object_store::ObjectStore;
use zarrs_filesystem::FilesystemStore;
use zarrs_object_store::AsyncObjectStore;
use zarrs_storage::storage_adapter::async_to_sync::{
    AsyncToSyncBlockOn, AsyncToSyncStorageAdapter,
};

use crate::config::StorageConfig;
use crate::error::{DatasetError, Result};

/// Blocking executor that works from within a tokio runtime.
///
/// Uses `tokio::task::block_in_place` to move the current task to a blocking
/// thread, then drives the future on the current runtime handle. Must be
/// called on a multi-threaded runtime.
#[derive(Clone, Copy)]
pub struct TokioBlockOn;

impl AsyncToSyncBlockOn for TokioBlockOn {
    fn block_on<F: core::future::Future>(&self, future: F) -> F::Output {
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
    }
}

/// Async Zarr storage rooted at a path prefix inside a bucket.
pub type AsyncMinioStorage = AsyncObjectStore<PrefixStore<AmazonS3>>;

/// Sync adapter over [`AsyncMinioStorage`], usable with the zarrs API.
pub type MinioStorage = AsyncToSyncStorageAdapter<AsyncMinioStorage, TokioBlockOn>;

/// Reject bucket names and store paths that could escape their location.
///
/// Paths are `/`-separated; every segment must be non-empty and must not be
/// `.` or `..`. Backslashes are rejected outright.
pub fn validate_location(bucket: &str, path: &str) -> Result<()> {
    if bucket.is_empty()
        || bucket.contains('/')
        || bucket.contains('\\')
        || bucket == "."
        || bucket == ".."
    {
        return Err(DatasetError::InvalidPath(format!("bad bucket name '{}'", bucket)));
    }

    if path.is_empty() || path.contains('\\') {
        return Err(DatasetError::InvalidPath(format!("bad store path '{}'", path)));
    }

    if let Some(segment) = path
        .split('/')
        .find(|s| s.is_empty() || *s == "." || *s == "..")
    {
        return Err(DatasetError::InvalidPath(format!(
            "bad segment '{}' in store path '{}'",
            segment, path
        )));
    }

    Ok(())
}

/// Build an S3 client for one bucket.
pub fn build_s3_client(config: &StorageConfig, bucket: &str) -> Result<AmazonS3> {
    AmazonS3Builder::new()
        .with_endpoint(&config.endpoint)
        .with_bucket_name(bucket)
        .with_access_key_id(&config.access_key_id)
        .with_secret_access_key(&config.secret_access_key)
        .with_region(&config.region)
        .with_allow_http(config.allow_http)
        .build()
        .map_err(|e| DatasetError::storage(format!("Failed to create S3 client: {}", e)))
}

/// Create Zarr storage for the store at `{bucket}/{path}`.
///
/// No request is made until the storage is read or written.
pub fn create_minio_storage(
    config: &StorageConfig,
    bucket: &str,
    path: &str,
) -> Result<Arc<MinioStorage>> {
    validate_location(bucket, path)?;

    let s3 = build_s3_client(config, bucket)?;
    Ok(sync_object_storage(PrefixStore::new(s3, path)))
}

/// Wrap any object store for the synchronous zarrs API.
///
/// Reads and writes block on the current tokio runtime through
/// [`TokioBlockOn`].
pub fn sync_object_storage<T: ObjectStore>(
    store: T,
) -> Arc<AsyncToSyncStorageAdapter<AsyncObjectStore<T>, TokioBlockOn>> {
    let async_store = Arc::new(AsyncObjectStore::new(store));
    Arc::new(AsyncToSyncStorageAdapter::new(async_store, TokioBlockOn))
}

/// Delete every object under `{bucket}/{path}`, returning how many were removed.
pub async fn clear_prefix(config: &StorageConfig, bucket: &str, path: &str) -> Result<usize> {
    validate_location(bucket, path)?;

    let s3 = build_s3_client(config, bucket)?;
    let prefix = object_store::path::Path::from(path);

    let objects: Vec<_> = s3
        .list(Some(&prefix))
        .try_collect()
        .await
        .map_err(|e| DatasetError::storage(format!("Failed to list {}/{}: {}", bucket, path, e)))?;

    for meta in &objects {
        s3.delete(&meta.location).await.map_err(|e| {
            DatasetError::storage(format!("Failed to delete {}: {}", meta.location, e))
        })?;
    }

    tracing::debug!(bucket = %bucket, path = %path, deleted = objects.len(), "Cleared prefix");

    Ok(objects.len())
}

/// Directory of the store at `{bucket}/{path}` under a local root.
pub fn local_store_dir(root: &Path, bucket: &str, path: &str) -> Result<PathBuf> {
    validate_location(bucket, path)?;
    Ok(path.split('/').fold(root.join(bucket), |dir, segment| dir.join(segment)))
}

/// Create filesystem Zarr storage for `{bucket}/{path}` under `root`.
///
/// With `create` set, the directory is created (any previous contents are
/// removed first). Otherwise the directory must already exist.
pub fn create_filesystem_storage(
    root: &Path,
    bucket: &str,
    path: &str,
    create: bool,
) -> Result<Arc<FilesystemStore>> {
    let dir = local_store_dir(root, bucket, path)?;

    if create {
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;
    } else if !dir.is_dir() {
        return Err(DatasetError::open_failed(format!(
            "no dataset at {}/{}",
            bucket, path
        )));
    }

    let store = FilesystemStore::new(&dir)
        .map_err(|e| DatasetError::storage(format!("{}: {}", dir.display(), e)))?;
    Ok(Arc::new(store))
}
