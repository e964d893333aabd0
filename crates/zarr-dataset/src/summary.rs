//! Dataset metadata summaries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dataset::Dataset;
use crate::error::{DatasetError, Result};
use crate::query::{LATITUDE, LONGITUDE, TIME};
use crate::time::format_timestamp;

/// Closed numeric range of a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// First and last labels of the time coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSummary {
    pub latitude: ValueRange,
    pub longitude: ValueRange,
    /// Present only when the dataset has a time dimension.
    pub time: Option<TimeRange>,
}

/// Everything a client needs to know before querying a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub variables: Vec<String>,
    pub dimensions: BTreeMap<String, u64>,
    pub coordinates: CoordinateSummary,
    pub attributes: Map<String, Value>,
}

impl Dataset {
    /// Summarize variables, dimension sizes, coordinate ranges and attributes.
    pub fn summary(&self) -> Result<DatasetSummary> {
        let latitude = self.numeric_range(LATITUDE)?;
        let longitude = self.numeric_range(LONGITUDE)?;

        let time = match self.coordinate(TIME) {
            Some(coordinate) => {
                let times = coordinate.as_time().ok_or_else(|| {
                    DatasetError::invalid_metadata("'time' coordinate is not a time axis")
                })?;
                match (times.first(), times.last()) {
                    (Some(start), Some(end)) => Some(TimeRange {
                        start: format_timestamp(start),
                        end: format_timestamp(end),
                    }),
                    _ => None,
                }
            }
            None => None,
        };

        Ok(DatasetSummary {
            variables: self.variable_names(),
            dimensions: self
                .dimensions()
                .iter()
                .map(|d| (d.name.clone(), d.size))
                .collect(),
            coordinates: CoordinateSummary {
                latitude,
                longitude,
                time,
            },
            attributes: self.attributes().clone(),
        })
    }

    fn numeric_range(&self, name: &str) -> Result<ValueRange> {
        let coordinate = self
            .coordinate(name)
            .ok_or_else(|| DatasetError::MissingCoordinate(name.to_string()))?;
        let (min, max) = coordinate.numeric_range().ok_or_else(|| {
            DatasetError::invalid_metadata(format!("coordinate '{}' has no numeric labels", name))
        })?;
        Ok(ValueRange { min, max })
    }
}
