//! Bucket management through the S3 API.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use tracing::{debug, info, warn};
use zarr_dataset::StorageConfig;

/// Build an S3 client for the configured endpoint using path-style addressing.
pub async fn s3_client(config: &StorageConfig) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "static",
    );

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}

/// Create `bucket` if it does not exist. Failures are logged, never returned.
///
/// Returns whether a new bucket was created.
pub async fn ensure_bucket(client: &aws_sdk_s3::Client, bucket: &str) -> bool {
    match client.create_bucket().bucket(bucket).send().await {
        Ok(_) => {
            info!(bucket = %bucket, "Created bucket");
            true
        }
        Err(e) => {
            let exists = e
                .as_service_error()
                .map(|se| se.is_bucket_already_owned_by_you() || se.is_bucket_already_exists())
                .unwrap_or(false);
            if exists {
                debug!(bucket = %bucket, "Bucket already exists");
            } else {
                warn!(bucket = %bucket, error = %DisplayErrorContext(&e), "Could not create bucket");
            }
            false
        }
    }
}
