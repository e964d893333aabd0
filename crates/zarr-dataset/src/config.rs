//! Configuration for storage access and Zarr writing.

use serde::{Deserialize, Serialize};

/// Connection settings for the S3/MinIO object store.
///
/// The bucket is not part of the configuration: every request names its own
/// bucket, so clients are built per `{bucket}/{path}` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// S3/MinIO endpoint URL (e.g., "http://minio:9000")
    pub endpoint: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// AWS region (use "us-east-1" for MinIO)
    pub region: String,
    /// Allow HTTP (required for local MinIO)
    pub allow_http: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://minio:9000".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            allow_http: true,
        }
    }
}

impl StorageConfig {
    /// Create config from environment variables, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: std::env::var("S3_ENDPOINT").unwrap_or(defaults.endpoint),
            access_key_id: std::env::var("S3_ACCESS_KEY").unwrap_or(defaults.access_key_id),
            secret_access_key: std::env::var("S3_SECRET_KEY")
                .unwrap_or(defaults.secret_access_key),
            region: std::env::var("S3_REGION").unwrap_or(defaults.region),
            allow_http: std::env::var("S3_ALLOW_HTTP")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.allow_http),
        }
    }
}

/// Settings for writing datasets to Zarr.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Edge length of the square latitude/longitude chunk tiles.
    pub spatial_chunk_size: usize,

    /// Chunk length along the time axis (`None` keeps the whole axis in one chunk).
    pub time_chunk_size: Option<usize>,

    /// Compression codec for data variables.
    pub compression: ZarrCompression,

    /// Compression level (1-9).
    pub compression_level: u8,

    /// Enable byte shuffle filter for better compression.
    pub shuffle: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            spatial_chunk_size: 25,
            time_chunk_size: None,
            compression: ZarrCompression::BloscZstd,
            compression_level: 1,
            shuffle: true,
        }
    }
}

impl WriterConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.spatial_chunk_size == 0 {
            return Err("spatial_chunk_size must be > 0".to_string());
        }

        if self.time_chunk_size == Some(0) {
            return Err("time_chunk_size must be > 0".to_string());
        }

        if self.compression_level == 0 || self.compression_level > 9 {
            return Err("compression_level must be 1-9".to_string());
        }

        Ok(())
    }
}

/// Compression codec for Zarr arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZarrCompression {
    /// No compression.
    None,
    /// Blosc with LZ4.
    BloscLz4,
    /// Blosc with Zstd.
    #[default]
    BloscZstd,
}

impl ZarrCompression {
    /// Parse from string (case-insensitive), defaulting to Blosc Zstd.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => Self::None,
            "lz4" | "blosc_lz4" => Self::BloscLz4,
            "zstd" | "blosc_zstd" => Self::BloscZstd,
            _ => Self::BloscZstd,
        }
    }

    /// Get the codec name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

impl std::fmt::Display for ZarrCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
