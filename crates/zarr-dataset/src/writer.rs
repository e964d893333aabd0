//! Zarr V3 writer for labeled datasets.
//!
//! A dataset becomes a root group carrying the dataset attributes, with one
//! child array per coordinate and data variable.

use std::sync::Arc;

use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::codec::BytesToBytesCodecTraits;
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs::storage::{ReadableStorageTraits, WritableStorageTraits};

use crate::config::{WriterConfig, ZarrCompression};
use crate::coords::{Coordinate, CoordinateValues};
use crate::dataset::DIMENSIONS_ATTRIBUTE;
use crate::definition::{DatasetDefinition, VariableDefinition};
use crate::error::{DatasetError, Result};
use crate::time::{TimeEncoding, CALENDAR};

/// Result of writing a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetWriteResult {
    /// Number of arrays written (coordinates and data variables).
    pub arrays_written: usize,
    /// Uncompressed bytes of array data written.
    pub bytes_written: u64,
}

/// Writer for creating Zarr V3 datasets.
pub struct DatasetWriter {
    config: WriterConfig,
}

impl DatasetWriter {
    /// Create a new DatasetWriter with the given configuration.
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    /// Write a dataset at the root of `storage`.
    ///
    /// The definition is validated before anything is stored. Existing arrays
    /// with the same names are overwritten; clearing stale content is the
    /// caller's job.
    pub fn write<S>(&self, storage: Arc<S>, definition: &DatasetDefinition) -> Result<DatasetWriteResult>
    where
        S: ReadableStorageTraits + WritableStorageTraits + 'static,
    {
        self.config.validate().map_err(DatasetError::Config)?;
        definition.validate()?;

        let group = GroupBuilder::new()
            .attributes(definition.attributes.clone())
            .build(storage.clone(), "/")
            .map_err(|e| DatasetError::write_failed(e.to_string()))?;
        group
            .store_metadata()
            .map_err(|e| DatasetError::write_failed(e.to_string()))?;

        let mut result = DatasetWriteResult {
            arrays_written: 0,
            bytes_written: 0,
        };

        for coordinate in &definition.coordinates {
            result.bytes_written += self.write_coordinate(storage.clone(), coordinate)?;
            result.arrays_written += 1;
        }

        for variable in &definition.variables {
            result.bytes_written += self.write_variable(storage.clone(), definition, variable)?;
            result.arrays_written += 1;
        }

        tracing::info!(
            arrays = result.arrays_written,
            bytes = result.bytes_written,
            compression = %self.config.compression,
            "Wrote dataset"
        );

        Ok(result)
    }

    /// Write a coordinate array as a single chunk.
    fn write_coordinate<S>(&self, storage: Arc<S>, coordinate: &Coordinate) -> Result<u64>
    where
        S: ReadableStorageTraits + WritableStorageTraits + 'static,
    {
        let len = coordinate.len() as u64;
        let chunk_grid = chunk_grid(vec![len.max(1)])?;

        let mut attrs = serde_json::Map::new();
        attrs.insert(
            DIMENSIONS_ATTRIBUTE.to_string(),
            serde_json::json!([coordinate.name]),
        );

        match &coordinate.values {
            CoordinateValues::Numeric(values) => {
                let mut builder =
                    ArrayBuilder::new(vec![len], DataType::Float64, chunk_grid, FillValue::from(f64::NAN));
                builder
                    .attributes(attrs)
                    .dimension_names(Some([coordinate.name.as_str()]));
                let array = build_array(&builder, storage, &coordinate.name)?;
                store_values(&array, values)?;
                Ok((values.len() * std::mem::size_of::<f64>()) as u64)
            }
            CoordinateValues::Time(times) => {
                let encoding = TimeEncoding::for_times(times);
                let offsets = times
                    .iter()
                    .map(|t| encoding.encode(*t))
                    .collect::<Result<Vec<i64>>>()?;

                attrs.insert("units".to_string(), serde_json::json!(encoding.units()));
                attrs.insert("calendar".to_string(), serde_json::json!(CALENDAR));
                attrs.insert("standard_name".to_string(), serde_json::json!("time"));

                let mut builder =
                    ArrayBuilder::new(vec![len], DataType::Int64, chunk_grid, FillValue::from(0i64));
                builder
                    .attributes(attrs)
                    .dimension_names(Some([coordinate.name.as_str()]));
                let array = build_array(&builder, storage, &coordinate.name)?;
                store_values(&array, &offsets)?;
                Ok((offsets.len() * std::mem::size_of::<i64>()) as u64)
            }
        }
    }

    /// Write a data variable, chunked and compressed per the configuration.
    fn write_variable<S>(
        &self,
        storage: Arc<S>,
        definition: &DatasetDefinition,
        variable: &VariableDefinition,
    ) -> Result<u64>
    where
        S: ReadableStorageTraits + WritableStorageTraits + 'static,
    {
        let shape = definition.variable_shape(variable)?;
        let chunk_shape = self.chunk_shape(definition, variable, &shape);

        let mut attrs = variable.attributes.clone();
        attrs.insert(
            DIMENSIONS_ATTRIBUTE.to_string(),
            serde_json::json!(variable.dimensions),
        );

        let mut builder = ArrayBuilder::new(
            shape.iter().map(|&n| n as u64).collect(),
            DataType::Float64,
            chunk_grid(chunk_shape)?,
            FillValue::from(f64::NAN),
        );
        builder
            .attributes(attrs)
            .dimension_names(Some(variable.dimensions.clone()));

        if self.config.compression != ZarrCompression::None {
            builder.bytes_to_bytes_codecs(vec![self.create_compression_codec()?]);
        }

        let array = build_array(&builder, storage, &variable.name)?;
        store_values(&array, &variable.values)?;

        tracing::debug!(
            variable = %variable.name,
            shape = ?shape,
            "Wrote variable"
        );

        Ok((variable.values.len() * std::mem::size_of::<f64>()) as u64)
    }

    /// Chunk shape for a variable: the time axis per `time_chunk_size`,
    /// every other axis in square tiles of `spatial_chunk_size`.
    fn chunk_shape(
        &self,
        definition: &DatasetDefinition,
        variable: &VariableDefinition,
        shape: &[usize],
    ) -> Vec<u64> {
        variable
            .dimensions
            .iter()
            .zip(shape)
            .map(|(dim, &len)| {
                let is_time = definition
                    .coordinate(dim)
                    .is_some_and(|c| c.as_time().is_some());
                let chunk = if is_time {
                    self.config.time_chunk_size.unwrap_or(len)
                } else {
                    self.config.spatial_chunk_size
                };
                chunk.min(len).max(1) as u64
            })
            .collect()
    }

    /// Create the compression codec based on configuration.
    fn create_compression_codec(&self) -> Result<Arc<dyn BytesToBytesCodecTraits>> {
        let level = BloscCompressionLevel::try_from(self.config.compression_level)
            .map_err(|_| DatasetError::Config("Invalid compression level".to_string()))?;

        let shuffle = if self.config.shuffle {
            BloscShuffleMode::Shuffle
        } else {
            BloscShuffleMode::NoShuffle
        };

        // typesize is required when shuffle is enabled
        let typesize = if self.config.shuffle {
            Some(std::mem::size_of::<f64>())
        } else {
            None
        };

        let compressor = match self.config.compression {
            ZarrCompression::None => {
                return Err(DatasetError::Config(
                    "No compression configured".to_string(),
                ))
            }
            ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
            ZarrCompression::BloscZstd => BloscCompressor::Zstd,
        };

        let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
            .map_err(|e| DatasetError::Config(e.to_string()))?;

        Ok(Arc::new(codec))
    }
}

fn chunk_grid(chunk_shape: Vec<u64>) -> Result<zarrs::array::ChunkGrid> {
    chunk_shape
        .try_into()
        .map_err(|e| DatasetError::Config(format!("{:?}", e)))
}

fn build_array<S>(builder: &ArrayBuilder, storage: Arc<S>, name: &str) -> Result<Array<S>>
where
    S: ReadableStorageTraits + WritableStorageTraits + 'static,
{
    let array = builder
        .build(storage, &format!("/{}", name))
        .map_err(|e| DatasetError::write_failed(format!("{}: {}", name, e)))?;
    array
        .store_metadata()
        .map_err(|e| DatasetError::write_failed(format!("{}: {}", name, e)))?;
    Ok(array)
}

fn store_values<S, T>(array: &Array<S>, values: &[T]) -> Result<()>
where
    S: ReadableStorageTraits + WritableStorageTraits + 'static,
    T: zarrs::array::Element,
{
    if values.is_empty() {
        return Ok(());
    }
    let subset = ArraySubset::new_with_shape(array.shape().to_vec());
    array
        .store_array_subset_elements(&subset, values)
        .map_err(|e| DatasetError::write_failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_time;
    use zarrs_filesystem::FilesystemStore;

    fn small_definition() -> DatasetDefinition {
        let times = vec![
            parse_time("2023-01-01").unwrap(),
            parse_time("2023-01-02").unwrap(),
        ];
        let values = (0..12).map(|i| i as f64).collect();
        DatasetDefinition::default()
            .with_coordinate(Coordinate::time("time", times))
            .with_coordinate(Coordinate::numeric("latitude", vec![30.0, 40.0]))
            .with_coordinate(Coordinate::numeric("longitude", vec![130.0, 135.0, 140.0]))
            .with_variable(
                VariableDefinition::new("temperature", ["time", "latitude", "longitude"], values)
                    .with_attribute("units", "degC"),
            )
    }

    #[test]
    fn test_write_uncompressed() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = Arc::new(FilesystemStore::new(temp_dir.path()).expect("Failed to create store"));

        let writer = DatasetWriter::new(WriterConfig {
            compression: ZarrCompression::None,
            ..Default::default()
        });
        let result = writer.write(store, &small_definition()).expect("Failed to write");

        assert_eq!(result.arrays_written, 4);
        assert_eq!(result.bytes_written, (2 * 8 + 2 * 8 + 3 * 8 + 12 * 8) as u64);
        assert!(temp_dir.path().join("zarr.json").exists());
        assert!(temp_dir.path().join("temperature").join("zarr.json").exists());
    }

    #[test]
    fn test_write_with_compression() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = Arc::new(FilesystemStore::new(temp_dir.path()).expect("Failed to create store"));

        let writer = DatasetWriter::new(WriterConfig {
            compression: ZarrCompression::BloscLz4,
            spatial_chunk_size: 2,
            ..Default::default()
        });
        let result = writer.write(store, &small_definition()).expect("Failed to write");
        assert_eq!(result.arrays_written, 4);
    }

    #[test]
    fn test_invalid_definition_writes_nothing() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = Arc::new(FilesystemStore::new(temp_dir.path()).expect("Failed to create store"));

        let mut definition = small_definition();
        definition.variables[0].values.pop();

        let writer = DatasetWriter::new(WriterConfig::default());
        assert!(writer.write(store, &definition).is_err());
        assert!(!temp_dir.path().join("zarr.json").exists());
    }

    #[test]
    fn test_chunk_shape_keeps_time_whole() {
        let writer = DatasetWriter::new(WriterConfig {
            spatial_chunk_size: 2,
            ..Default::default()
        });
        let definition = small_definition();
        let variable = &definition.variables[0];
        let shape = definition.variable_shape(variable).unwrap();
        assert_eq!(writer.chunk_shape(&definition, variable, &shape), vec![2, 2, 2]);
    }
}
