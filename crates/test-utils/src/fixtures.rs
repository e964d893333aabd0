//! Common test fixtures for dataset tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Query points over the default 30–40°N, 130–140°E grid.
pub mod points {
    /// Centre of the grid.
    pub const CENTER: (f64, f64) = (35.0, 135.0);

    /// South-west grid corner.
    pub const SW_CORNER: (f64, f64) = (30.0, 130.0);

    /// North-east grid corner.
    pub const NE_CORNER: (f64, f64) = (40.0, 140.0);

    /// Far outside the grid; selection clamps to the nearest edge.
    pub const OUTSIDE: (f64, f64) = (0.0, 0.0);
}

/// Default store location used by the generator and the API.
pub mod location {
    pub const BUCKET: &str = "testdata";
    pub const PATH: &str = "weather.zarr";
}

/// A temporary data directory laid out as `<root>/<bucket>/<path>`.
///
/// The directory is removed when the fixture is dropped.
pub struct TempDataDir {
    dir: TempDir,
}

impl TempDataDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Root of the data directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory of the store at `{bucket}/{path}`.
    pub fn store_dir(&self, bucket: &str, path: &str) -> PathBuf {
        self.dir.path().join(bucket).join(path)
    }
}

impl Default for TempDataDir {
    fn default() -> Self {
        Self::new()
    }
}
