//! Synthetic weather data generator.
//!
//! Builds one year of daily temperature, humidity and pressure fields over a
//! 100×100 grid and writes them as a Zarr V3 dataset, replacing whatever was
//! stored at the target location.

mod bucket;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use zarr_dataset::storage::{clear_prefix, create_filesystem_storage, create_minio_storage};
use zarr_dataset::{
    synthetic_weather, DatasetWriter, StorageConfig, SyntheticConfig, WriterConfig,
    ZarrCompression,
};

#[derive(Parser, Debug)]
#[command(name = "data-generator")]
#[command(about = "Generate the synthetic weather dataset")]
struct Args {
    /// Target bucket
    #[arg(long, default_value = "testdata", env = "GENERATOR_BUCKET")]
    bucket: String,

    /// Store path inside the bucket
    #[arg(long, default_value = "weather.zarr", env = "GENERATOR_PATH")]
    path: String,

    /// Write to <dir>/<bucket>/<path> on the local filesystem instead of object storage
    #[arg(long, env = "WEATHER_DATA_DIR")]
    output_dir: Option<PathBuf>,

    /// Compression codec (none, blosc_lz4, blosc_zstd)
    #[arg(long, default_value = "blosc_zstd")]
    compression: String,

    /// Compression level (1-9)
    #[arg(long, default_value = "1")]
    compression_level: u8,

    /// Latitude/longitude chunk edge length
    #[arg(long, default_value = "25")]
    spatial_chunk: usize,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .json()
        .init();

    let writer_config = WriterConfig {
        spatial_chunk_size: args.spatial_chunk,
        compression: ZarrCompression::from_str(&args.compression),
        compression_level: args.compression_level,
        ..Default::default()
    };
    writer_config.validate().map_err(|e| anyhow!(e))?;

    let synthetic = SyntheticConfig::default();
    let created_at = chrono::Local::now().naive_local();
    let definition = synthetic_weather(&synthetic, created_at)?;

    info!(
        times = synthetic.days,
        latitudes = synthetic.lat_points,
        longitudes = synthetic.lon_points,
        variables = definition.variables.len(),
        bucket = %args.bucket,
        path = %args.path,
        "Generating test data"
    );

    let writer = DatasetWriter::new(writer_config);

    let result = match &args.output_dir {
        Some(dir) => {
            let store = create_filesystem_storage(dir, &args.bucket, &args.path, true)?;
            tokio::task::spawn_blocking(move || writer.write(store, &definition))
                .await
                .context("Writer task failed")??
        }
        None => {
            let storage_config = StorageConfig::from_env();

            let client = bucket::s3_client(&storage_config).await;
            bucket::ensure_bucket(&client, &args.bucket).await;

            let removed = clear_prefix(&storage_config, &args.bucket, &args.path).await?;
            if removed > 0 {
                info!(objects = removed, "Removed previous dataset");
            }

            let store = create_minio_storage(&storage_config, &args.bucket, &args.path)?;
            tokio::task::spawn_blocking(move || writer.write(store, &definition))
                .await
                .context("Writer task failed")??
        }
    };

    info!(
        arrays = result.arrays_written,
        bytes = result.bytes_written,
        "Test data has been generated and uploaded"
    );

    Ok(())
}
