//! Read-only access to a labeled Zarr dataset.
//!
//! A dataset is a root group whose child arrays are either coordinates (a
//! one-dimensional array named after its only dimension) or data variables.

use std::ops::Range;

use serde_json::{Map, Value};
use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs::group::Group;
use zarrs::storage::{ReadableListableStorage, ReadableListableStorageTraits};

use crate::coords::Coordinate;
use crate::error::{DatasetError, Result};
use crate::time::TimeEncoding;

/// Attribute holding an array's dimension labels (xarray convention).
pub const DIMENSIONS_ATTRIBUTE: &str = "_ARRAY_DIMENSIONS";

type DatasetArray = Array<dyn ReadableListableStorageTraits>;

/// A named dimension and its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub size: u64,
}

/// A data variable backed by a Zarr array.
pub struct Variable {
    name: String,
    dimensions: Vec<String>,
    array: DatasetArray,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn shape(&self) -> &[u64] {
        self.array.shape()
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        self.array.attributes()
    }

    pub fn has_dimension(&self, dimension: &str) -> bool {
        self.dimensions.iter().any(|d| d == dimension)
    }

    /// Read a hyperrectangle (one range per dimension) as `f64` in row-major order.
    pub fn read(&self, ranges: &[Range<u64>]) -> Result<Vec<f64>> {
        if ranges.len() != self.dimensions.len() {
            return Err(DatasetError::read_failed(format!(
                "'{}' has {} dimensions but {} ranges were given",
                self.name,
                self.dimensions.len(),
                ranges.len()
            )));
        }
        let subset = ArraySubset::new_with_ranges(ranges);
        retrieve_f64(&self.array, &subset)
            .map_err(|e| DatasetError::read_failed(format!("{}: {}", self.name, e)))
    }
}

impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field("dimensions", &self.dimensions)
            .field("shape", &self.array.shape())
            .finish()
    }
}

/// An opened dataset: attributes, dimensions, loaded coordinates and lazily
/// read data variables.
#[derive(Debug)]
pub struct Dataset {
    attributes: Map<String, Value>,
    dimensions: Vec<Dimension>,
    coordinates: Vec<Coordinate>,
    variables: Vec<Variable>,
}

impl Dataset {
    /// Open the dataset rooted at the top of `storage`.
    ///
    /// Coordinates are read eagerly; data variables only open their metadata.
    pub fn open(storage: ReadableListableStorage) -> Result<Self> {
        let group = Group::open(storage.clone(), "/")
            .map_err(|e| DatasetError::open_failed(e.to_string()))?;
        let attributes = group.attributes().clone();

        let mut paths: Vec<String> = group
            .child_array_paths(false)
            .map_err(|e| DatasetError::storage(e.to_string()))?
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        paths.sort();

        let mut dataset = Self {
            attributes,
            dimensions: Vec::new(),
            coordinates: Vec::new(),
            variables: Vec::new(),
        };

        for path in paths {
            let array = Array::open(storage.clone(), &path)
                .map_err(|e| DatasetError::open_failed(format!("{}: {}", path, e)))?;
            let name = path.trim_start_matches('/').to_string();
            let dimensions = array_dimensions(&array, &name)?;

            for (dim, &size) in dimensions.iter().zip(array.shape()) {
                dataset.register_dimension(dim, size)?;
            }

            if dimensions.len() == 1 && dimensions[0] == name {
                let coordinate = read_coordinate(&array, &name)?;
                dataset.coordinates.push(coordinate);
            } else {
                dataset.variables.push(Variable {
                    name,
                    dimensions,
                    array,
                });
            }
        }

        tracing::debug!(
            variables = ?dataset.variable_names(),
            dimensions = dataset.dimensions.len(),
            "Opened dataset"
        );

        Ok(dataset)
    }

    fn register_dimension(&mut self, name: &str, size: u64) -> Result<()> {
        match self.dimensions.iter().find(|d| d.name == name) {
            Some(existing) if existing.size != size => Err(DatasetError::invalid_metadata(
                format!(
                    "dimension '{}' has conflicting sizes {} and {}",
                    name, existing.size, size
                ),
            )),
            Some(_) => Ok(()),
            None => {
                self.dimensions.push(Dimension {
                    name: name.to_string(),
                    size,
                });
                Ok(())
            }
        }
    }

    /// Free-form dataset attributes.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn coordinate(&self, name: &str) -> Option<&Coordinate> {
        self.coordinates.iter().find(|c| c.name == name)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Names of the data variables (coordinates excluded).
    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }
}

/// Dimension labels of an array: `_ARRAY_DIMENSIONS` first, then the Zarr V3
/// `dimension_names`, then positional `dim_N` names.
fn array_dimensions(array: &DatasetArray, name: &str) -> Result<Vec<String>> {
    let ndim = array.shape().len();

    let labels = match array.attributes().get(DIMENSIONS_ATTRIBUTE) {
        Some(value) => Some(string_list(value).ok_or_else(|| {
            DatasetError::invalid_metadata(format!("'{}' has malformed {}", name, DIMENSIONS_ATTRIBUTE))
        })?),
        None => serde_json::to_value(array.dimension_names())
            .ok()
            .as_ref()
            .and_then(string_list),
    };

    let labels = labels.unwrap_or_else(|| (0..ndim).map(|i| format!("dim_{}", i)).collect());

    if labels.len() != ndim {
        return Err(DatasetError::invalid_metadata(format!(
            "'{}' has {} dimensions but {} dimension labels",
            name,
            ndim,
            labels.len()
        )));
    }

    Ok(labels)
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Load a coordinate array, decoding CF time units when present.
fn read_coordinate(array: &DatasetArray, name: &str) -> Result<Coordinate> {
    let subset = ArraySubset::new_with_shape(array.shape().to_vec());
    let time_units = array
        .attributes()
        .get("units")
        .and_then(Value::as_str)
        .filter(|units| units.contains(" since "));

    let Some(units) = time_units else {
        let values = retrieve_f64(array, &subset)?;
        return Ok(Coordinate::numeric(name, values));
    };

    let encoding = TimeEncoding::parse(units)?;
    let times = match array.data_type() {
        DataType::Int64 | DataType::Int32 | DataType::Int16 | DataType::UInt32 => {
            retrieve_i64(array, &subset)?
                .into_iter()
                .map(|offset| encoding.decode(offset))
                .collect::<Result<Vec<_>>>()?
        }
        _ => retrieve_f64(array, &subset)?
            .into_iter()
            .map(|offset| encoding.decode_fractional(offset))
            .collect::<Result<Vec<_>>>()?,
    };

    Ok(Coordinate::time(name, times))
}

fn retrieve_f64(array: &DatasetArray, subset: &ArraySubset) -> Result<Vec<f64>> {
    let read_err = |e: zarrs::array::ArrayError| DatasetError::read_failed(e.to_string());
    let values = match array.data_type() {
        DataType::Float64 => array
            .retrieve_array_subset_elements::<f64>(subset)
            .map_err(read_err)?,
        DataType::Float32 => widen(
            array
                .retrieve_array_subset_elements::<f32>(subset)
                .map_err(read_err)?,
        ),
        DataType::Int64 => array
            .retrieve_array_subset_elements::<i64>(subset)
            .map_err(read_err)?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        DataType::Int32 => widen(
            array
                .retrieve_array_subset_elements::<i32>(subset)
                .map_err(read_err)?,
        ),
        DataType::Int16 => widen(
            array
                .retrieve_array_subset_elements::<i16>(subset)
                .map_err(read_err)?,
        ),
        DataType::UInt32 => widen(
            array
                .retrieve_array_subset_elements::<u32>(subset)
                .map_err(read_err)?,
        ),
        DataType::UInt16 => widen(
            array
                .retrieve_array_subset_elements::<u16>(subset)
                .map_err(read_err)?,
        ),
        other => {
            return Err(DatasetError::read_failed(format!(
                "unsupported data type {:?}",
                other
            )))
        }
    };
    Ok(values)
}

fn retrieve_i64(array: &DatasetArray, subset: &ArraySubset) -> Result<Vec<i64>> {
    let read_err = |e: zarrs::array::ArrayError| DatasetError::read_failed(e.to_string());
    let values = match array.data_type() {
        DataType::Int64 => array
            .retrieve_array_subset_elements::<i64>(subset)
            .map_err(read_err)?,
        DataType::Int32 => array
            .retrieve_array_subset_elements::<i32>(subset)
            .map_err(read_err)?
            .into_iter()
            .map(i64::from)
            .collect(),
        DataType::Int16 => array
            .retrieve_array_subset_elements::<i16>(subset)
            .map_err(read_err)?
            .into_iter()
            .map(i64::from)
            .collect(),
        DataType::UInt32 => array
            .retrieve_array_subset_elements::<u32>(subset)
            .map_err(read_err)?
            .into_iter()
            .map(i64::from)
            .collect(),
        other => {
            return Err(DatasetError::read_failed(format!(
                "unsupported time data type {:?}",
                other
            )))
        }
    };
    Ok(values)
}

fn widen<T: Into<f64>>(values: Vec<T>) -> Vec<f64> {
    values.into_iter().map(Into::into).collect()
}
