//! Coordinate values and nearest-neighbour selection.

use chrono::NaiveDateTime;

use crate::error::{DatasetError, Result};

/// Values of a one-dimensional coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateValues {
    /// Floating point labels (latitude, longitude, levels).
    Numeric(Vec<f64>),
    /// Timestamp labels.
    Time(Vec<NaiveDateTime>),
}

impl CoordinateValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Time(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named coordinate array labelling one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub name: String,
    pub values: CoordinateValues,
}

impl Coordinate {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: CoordinateValues::Numeric(values),
        }
    }

    pub fn time(name: impl Into<String>, values: Vec<NaiveDateTime>) -> Self {
        Self {
            name: name.into(),
            values: CoordinateValues::Time(values),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.values {
            CoordinateValues::Numeric(values) => Some(values),
            CoordinateValues::Time(_) => None,
        }
    }

    pub fn as_time(&self) -> Option<&[NaiveDateTime]> {
        match &self.values {
            CoordinateValues::Time(values) => Some(values),
            CoordinateValues::Numeric(_) => None,
        }
    }

    /// Minimum and maximum of a numeric coordinate, ignoring NaN labels.
    pub fn numeric_range(&self) -> Option<(f64, f64)> {
        self.as_numeric()?
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((min, max)) => Some((min.min(v), max.max(v))),
            })
    }

    /// Index and label of the numeric label closest to `target`.
    pub fn nearest_numeric(&self, target: f64) -> Result<(usize, f64)> {
        let values = self.as_numeric().ok_or_else(|| {
            DatasetError::invalid_metadata(format!("coordinate '{}' is not numeric", self.name))
        })?;

        if target.is_nan() {
            return Err(DatasetError::read_failed(format!(
                "cannot select NaN on coordinate '{}'",
                self.name
            )));
        }

        let index = nearest_index(values, |v| (v - target).abs())
            .ok_or_else(|| self.empty_error())?;
        Ok((index, values[index]))
    }

    /// Index and label of the timestamp closest to `target`.
    pub fn nearest_time(&self, target: NaiveDateTime) -> Result<(usize, NaiveDateTime)> {
        let values = self.as_time().ok_or_else(|| {
            DatasetError::invalid_metadata(format!("coordinate '{}' is not a time axis", self.name))
        })?;

        let index = nearest_index(values, |t| {
            let delta = t.signed_duration_since(target);
            delta
                .num_microseconds()
                .map(|us| us.abs() as f64)
                .unwrap_or_else(|| delta.num_seconds().abs() as f64 * 1e6)
        })
        .ok_or_else(|| self.empty_error())?;
        Ok((index, values[index]))
    }

    fn empty_error(&self) -> DatasetError {
        DatasetError::read_failed(format!("coordinate '{}' has no labels", self.name))
    }
}

/// Index of the element with the smallest distance; ties go to the later element.
///
/// Elements whose distance is NaN are never selected.
pub fn nearest_index<T>(values: &[T], mut distance: impl FnMut(&T) -> f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, value) in values.iter().enumerate() {
        let d = distance(value);
        if d.is_nan() {
            continue;
        }
        match best {
            Some((_, best_d)) if d > best_d => {}
            _ => best = Some((index, d)),
        }
    }
    best.map(|(index, _)| index)
}
