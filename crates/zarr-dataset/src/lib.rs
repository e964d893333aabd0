//! Labeled weather datasets stored as Zarr V3.
//!
//! This crate covers both sides of the dataset lifecycle:
//! - Writing: [`DatasetDefinition`] + [`DatasetWriter`] produce a root group
//!   with coordinate and data-variable arrays
//! - Reading: [`Dataset::open`] loads coordinates and exposes variables for
//!   nearest-point queries ([`Dataset::query_point`]) and summaries
//!   ([`Dataset::summary`])
//!
//! Stores live in S3-compatible object storage or on the local filesystem,
//! addressed by `{bucket}/{path}`; see [`DatasetSource`].

pub mod config;
pub mod coords;
pub mod dataset;
pub mod definition;
pub mod error;
pub mod query;
pub mod source;
pub mod storage;
pub mod summary;
pub mod synthetic;
pub mod time;
pub mod writer;

pub use config::{StorageConfig, WriterConfig, ZarrCompression};
pub use coords::{Coordinate, CoordinateValues};
pub use dataset::{Dataset, Dimension, Variable};
pub use definition::{DatasetDefinition, VariableDefinition};
pub use error::{DatasetError, Result};
pub use query::{PointQuery, PointQueryResult, VariableValue};
pub use source::{DatasetSource, FilesystemSource, ObjectStoreSource};
pub use summary::{CoordinateSummary, DatasetSummary, TimeRange, ValueRange};
pub use synthetic::{synthetic_weather, SyntheticConfig};
pub use writer::{DatasetWriteResult, DatasetWriter};
