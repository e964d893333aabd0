//! Nearest-grid-point extraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::coords::Coordinate;
use crate::dataset::{Dataset, Variable};
use crate::error::{DatasetError, Result};
use crate::time::{format_timestamp, parse_time};

/// Name of the latitude coordinate.
pub const LATITUDE: &str = "latitude";
/// Name of the longitude coordinate.
pub const LONGITUDE: &str = "longitude";
/// Name of the time coordinate.
pub const TIME: &str = "time";

/// A point query against a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// Variables to extract; `None` extracts every data variable.
    pub variables: Option<Vec<String>>,
    /// Time to select on time-dimensioned variables; `None` returns the whole series.
    pub time: Option<String>,
}

impl PointQuery {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Default::default()
        }
    }

    /// Restrict the query to a comma-separated variable list.
    ///
    /// Names are trimmed. Empty entries are kept and fail resolution like any
    /// other unknown name.
    pub fn with_variable_list(mut self, list: &str) -> Self {
        self.variables = Some(list.split(',').map(|s| s.trim().to_string()).collect());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }
}

/// Extracted value of one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// A single value; NaN serializes as `null`.
    Scalar(f64),
    /// A time series keyed by ISO-8601 timestamp.
    Series(BTreeMap<String, Option<f64>>),
    /// Extraction failed for this variable only.
    Error(String),
}

/// Result of a point query: the matched grid point and a value per variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointQueryResult {
    /// Latitude of the selected grid point.
    pub latitude: f64,
    /// Longitude of the selected grid point.
    pub longitude: f64,
    pub values: BTreeMap<String, VariableValue>,
}

impl Dataset {
    /// Resolve requested variable names, failing on any unknown name.
    pub fn resolve_variables(&self, requested: Option<&[String]>) -> Result<Vec<&Variable>> {
        let Some(requested) = requested else {
            return Ok(self.variables().iter().collect());
        };

        let invalid: Vec<String> = requested
            .iter()
            .filter(|name| self.variable(name).is_none())
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(DatasetError::UnknownVariables {
                invalid,
                available: self.variable_names(),
            });
        }

        let mut variables = Vec::with_capacity(requested.len());
        for name in requested {
            if let Some(variable) = self.variable(name) {
                if !variables.iter().any(|v: &&Variable| v.name() == name) {
                    variables.push(variable);
                }
            }
        }
        Ok(variables)
    }

    /// Extract values at the grid point nearest to the query location.
    ///
    /// Unknown variables fail the whole query. Failures while extracting a
    /// single variable, including an unparsable time, are reported in that
    /// variable's slot.
    pub fn query_point(&self, query: &PointQuery) -> Result<PointQueryResult> {
        let variables = self.resolve_variables(query.variables.as_deref())?;

        let latitude = self.required_coordinate(LATITUDE)?;
        let longitude = self.required_coordinate(LONGITUDE)?;
        let (lat_index, lat_value) = latitude.nearest_numeric(query.latitude)?;
        let (lon_index, lon_value) = longitude.nearest_numeric(query.longitude)?;

        let mut values = BTreeMap::new();
        for variable in variables {
            let value = self
                .extract(variable, lat_index as u64, lon_index as u64, query.time.as_deref())
                .unwrap_or_else(|e| {
                    tracing::warn!(variable = %variable.name(), error = %e, "Point extraction failed");
                    VariableValue::Error(format!("Failed to get data: {}", e))
                });
            values.insert(variable.name().to_string(), value);
        }

        Ok(PointQueryResult {
            latitude: lat_value,
            longitude: lon_value,
            values,
        })
    }

    fn required_coordinate(&self, name: &str) -> Result<&Coordinate> {
        self.coordinate(name)
            .ok_or_else(|| DatasetError::MissingCoordinate(name.to_string()))
    }

    fn extract(
        &self,
        variable: &Variable,
        lat_index: u64,
        lon_index: u64,
        time: Option<&str>,
    ) -> Result<VariableValue> {
        for required in [LATITUDE, LONGITUDE] {
            if !variable.has_dimension(required) {
                return Err(DatasetError::MissingDimension {
                    variable: variable.name().to_string(),
                    dimension: required.to_string(),
                });
            }
        }

        let mut ranges = Vec::with_capacity(variable.dimensions().len());
        let mut series_labels = None;

        for (dim, &len) in variable.dimensions().iter().zip(variable.shape()) {
            let time_axis = self.coordinate(dim).and_then(Coordinate::as_time);
            match dim.as_str() {
                LATITUDE => ranges.push(lat_index..lat_index + 1),
                LONGITUDE => ranges.push(lon_index..lon_index + 1),
                _ if dim == TIME || time_axis.is_some() => {
                    let coordinate = self.required_coordinate(dim)?;
                    let labels = coordinate.as_time().ok_or_else(|| {
                        DatasetError::invalid_metadata(format!("'{}' is not a time axis", dim))
                    })?;
                    match time {
                        Some(time) => {
                            let (index, _) = coordinate.nearest_time(parse_time(time)?)?;
                            ranges.push(index as u64..index as u64 + 1);
                        }
                        None if series_labels.is_none() => {
                            ranges.push(0..len);
                            series_labels = Some(labels);
                        }
                        None => {
                            return Err(DatasetError::read_failed(format!(
                                "'{}' has more than one time dimension",
                                variable.name()
                            )))
                        }
                    }
                }
                _ if len == 1 => ranges.push(0..1),
                _ => {
                    return Err(DatasetError::read_failed(format!(
                        "'{}' has dimension '{}' of length {}, which cannot be reduced to a point",
                        variable.name(),
                        dim,
                        len
                    )))
                }
            }
        }

        let values = variable.read(&ranges)?;

        match series_labels {
            Some(labels) => {
                if labels.len() != values.len() {
                    return Err(DatasetError::read_failed(format!(
                        "expected {} values but read {}",
                        labels.len(),
                        values.len()
                    )));
                }
                Ok(VariableValue::Series(
                    labels
                        .iter()
                        .zip(values)
                        .map(|(t, v)| (format_timestamp(t), (!v.is_nan()).then_some(v)))
                        .collect(),
                ))
            }
            None => values
                .first()
                .map(|&v| VariableValue::Scalar(v))
                .ok_or_else(|| DatasetError::read_failed("no value at the selected point")),
        }
    }
}
