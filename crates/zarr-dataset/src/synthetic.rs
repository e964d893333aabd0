//! Synthetic weather dataset used for testing and demos.
//!
//! Every value is a deterministic function of the day index, latitude and
//! longitude, so tests can recompute any expected value.

use std::f64::consts::PI;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::coords::Coordinate;
use crate::definition::{DatasetDefinition, VariableDefinition};
use crate::error::{DatasetError, Result};
use crate::query::{LATITUDE, LONGITUDE, TIME};

/// Variables produced by the generator, with units and descriptive labels.
pub const VARIABLES: [(&str, &str, &str); 3] = [
    ("temperature", "degC", "Temperature (°C)"),
    ("humidity", "%", "Relative Humidity (%)"),
    ("pressure", "hPa", "Pressure (hPa)"),
];

/// Grid and time axis of the synthetic dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Inclusive latitude range in degrees.
    pub lat_range: (f64, f64),
    pub lat_points: usize,
    /// Inclusive longitude range in degrees.
    pub lon_range: (f64, f64),
    pub lon_points: usize,
    /// First day of the daily time axis.
    pub start_date: NaiveDate,
    pub days: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            lat_range: (30.0, 40.0),
            lat_points: 100,
            lon_range: (130.0, 140.0),
            lon_points: 100,
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            days: 365,
        }
    }
}

impl SyntheticConfig {
    pub fn latitudes(&self) -> Vec<f64> {
        linspace(self.lat_range.0, self.lat_range.1, self.lat_points)
    }

    pub fn longitudes(&self) -> Vec<f64> {
        linspace(self.lon_range.0, self.lon_range.1, self.lon_points)
    }

    /// Daily timestamps at midnight.
    pub fn times(&self) -> Result<Vec<NaiveDateTime>> {
        (0..self.days as u64)
            .map(|day| {
                self.start_date
                    .checked_add_days(Days::new(day))
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .ok_or_else(|| {
                        DatasetError::invalid_definition(format!(
                            "day {} after {} is out of range",
                            day, self.start_date
                        ))
                    })
            })
            .collect()
    }
}

/// `n` evenly spaced values over `[start, stop]`, endpoints included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + i as f64 * step })
                .collect()
        }
    }
}

/// Value of a generated variable on day `day` at (`lat`, `lon`).
pub fn value_at(variable: &str, day: usize, lat: f64, lon: f64) -> Option<f64> {
    let seasonal = (2.0 * PI * (day % 365) as f64 / 365.0).sin();
    let lat_term = (PI * (lat - 35.0) / 10.0).cos();
    let lon_term = (PI * (lon - 135.0) / 10.0).sin();

    match variable {
        "temperature" => Some(15.0 + 10.0 * seasonal + 5.0 * lat_term + 2.0 * lon_term),
        "humidity" => Some(65.0 + 15.0 * seasonal + 10.0 * lat_term + 5.0 * lon_term),
        "pressure" => Some(1013.0 + 10.0 * seasonal + 5.0 * lat_term),
        _ => None,
    }
}

/// Build the synthetic dataset stamped with `created_at`.
pub fn synthetic_weather(
    config: &SyntheticConfig,
    created_at: NaiveDateTime,
) -> Result<DatasetDefinition> {
    let latitudes = config.latitudes();
    let longitudes = config.longitudes();
    let times = config.times()?;

    let labels: Map<String, Value> = VARIABLES
        .iter()
        .map(|(name, _, label)| (name.to_string(), json!(label)))
        .collect();

    let mut attributes = Map::new();
    attributes.insert("description".to_string(), json!("Example Weather Dataset"));
    attributes.insert("creator".to_string(), json!("Test Data Generator"));
    attributes.insert(
        "created_at".to_string(),
        json!(created_at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()),
    );
    attributes.insert("variables".to_string(), Value::Object(labels));

    let mut definition = DatasetDefinition::new(attributes)
        .with_coordinate(Coordinate::time(TIME, times))
        .with_coordinate(Coordinate::numeric(LATITUDE, latitudes.clone()))
        .with_coordinate(Coordinate::numeric(LONGITUDE, longitudes.clone()));

    for (name, units, label) in VARIABLES {
        let mut values = Vec::with_capacity(config.days * latitudes.len() * longitudes.len());
        for day in 0..config.days {
            for &lat in &latitudes {
                for &lon in &longitudes {
                    values.push(value_at(name, day, lat, lon).unwrap_or(f64::NAN));
                }
            }
        }

        definition = definition.with_variable(
            VariableDefinition::new(name, [TIME, LATITUDE, LONGITUDE], values)
                .with_attribute("units", units)
                .with_attribute("long_name", label),
        );
    }

    Ok(definition)
}
