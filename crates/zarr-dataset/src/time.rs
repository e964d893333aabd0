//! CF-style time coordinates.
//!
//! Time coordinates are stored as integer offsets from an epoch, described by
//! a `units` attribute such as `"days since 2023-01-01 00:00:00"`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::error::{DatasetError, Result};

/// Calendar attribute written alongside time coordinates.
pub const CALENDAR: &str = "proleptic_gregorian";

/// Offset unit of an encoded time coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Units from coarsest to finest.
    pub const ALL: [TimeUnit; 7] = [
        TimeUnit::Days,
        TimeUnit::Hours,
        TimeUnit::Minutes,
        TimeUnit::Seconds,
        TimeUnit::Milliseconds,
        TimeUnit::Microseconds,
        TimeUnit::Nanoseconds,
    ];

    /// Parse a unit name (case-insensitive, singular or plural).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "days" | "day" | "d" => Some(Self::Days),
            "hours" | "hour" | "hr" | "h" => Some(Self::Hours),
            "minutes" | "minute" | "min" => Some(Self::Minutes),
            "seconds" | "second" | "sec" | "s" => Some(Self::Seconds),
            "milliseconds" | "millisecond" | "ms" => Some(Self::Milliseconds),
            "microseconds" | "microsecond" | "us" => Some(Self::Microseconds),
            "nanoseconds" | "nanosecond" | "ns" => Some(Self::Nanoseconds),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Seconds => "seconds",
            Self::Milliseconds => "milliseconds",
            Self::Microseconds => "microseconds",
            Self::Nanoseconds => "nanoseconds",
        }
    }

    /// Duration of `n` units, or `None` on overflow.
    fn duration(&self, n: i64) -> Option<Duration> {
        match self {
            Self::Days => Duration::try_days(n),
            Self::Hours => Duration::try_hours(n),
            Self::Minutes => Duration::try_minutes(n),
            Self::Seconds => Duration::try_seconds(n),
            Self::Milliseconds => Duration::try_milliseconds(n),
            Self::Microseconds => Some(Duration::microseconds(n)),
            Self::Nanoseconds => Some(Duration::nanoseconds(n)),
        }
    }

    fn nanoseconds(&self) -> i64 {
        match self {
            Self::Days => 86_400_000_000_000,
            Self::Hours => 3_600_000_000_000,
            Self::Minutes => 60_000_000_000,
            Self::Seconds => 1_000_000_000,
            Self::Milliseconds => 1_000_000,
            Self::Microseconds => 1_000,
            Self::Nanoseconds => 1,
        }
    }

    /// Whole number of units in `delta`, truncating toward zero.
    fn count(&self, delta: Duration) -> Option<i64> {
        match self {
            Self::Days => Some(delta.num_days()),
            Self::Hours => Some(delta.num_hours()),
            Self::Minutes => Some(delta.num_minutes()),
            Self::Seconds => Some(delta.num_seconds()),
            Self::Milliseconds => Some(delta.num_milliseconds()),
            Self::Microseconds => delta.num_microseconds(),
            Self::Nanoseconds => delta.num_nanoseconds(),
        }
    }
}

/// Encoding of timestamps as integer offsets from an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEncoding {
    pub unit: TimeUnit,
    pub epoch: NaiveDateTime,
}

impl TimeEncoding {
    pub fn new(unit: TimeUnit, epoch: NaiveDateTime) -> Self {
        Self { unit, epoch }
    }

    /// Parse a `"<unit> since <epoch>"` units attribute.
    pub fn parse(units: &str) -> Result<Self> {
        let (unit, epoch) = units.split_once(" since ").ok_or_else(|| {
            DatasetError::invalid_metadata(format!("not a time units string: '{}'", units))
        })?;

        let unit = TimeUnit::parse(unit).ok_or_else(|| {
            DatasetError::invalid_metadata(format!("unsupported time unit in '{}'", units))
        })?;

        let epoch = parse_time(epoch).map_err(|_| {
            DatasetError::invalid_metadata(format!("invalid epoch in time units '{}'", units))
        })?;

        Ok(Self { unit, epoch })
    }

    /// Choose the coarsest encoding that represents every timestamp exactly,
    /// using the earliest timestamp as epoch.
    pub fn for_times(times: &[NaiveDateTime]) -> Self {
        let epoch = times
            .iter()
            .min()
            .copied()
            .unwrap_or_default();

        TimeUnit::ALL
            .iter()
            .map(|&unit| Self::new(unit, epoch))
            .find(|encoding| times.iter().all(|&t| encoding.encode(t).is_ok()))
            .unwrap_or(Self::new(TimeUnit::Nanoseconds, epoch))
    }

    /// The `units` attribute value for this encoding.
    pub fn units(&self) -> String {
        format!(
            "{} since {}",
            self.unit.as_str(),
            self.epoch.format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// Convert an offset to a timestamp.
    pub fn decode(&self, offset: i64) -> Result<NaiveDateTime> {
        self.unit
            .duration(offset)
            .and_then(|delta| self.epoch.checked_add_signed(delta))
            .ok_or_else(|| {
                DatasetError::invalid_metadata(format!(
                    "time offset {} {} out of range",
                    offset,
                    self.unit.as_str()
                ))
            })
    }

    /// Convert a floating point offset, as written by some encoders, to a timestamp.
    pub fn decode_fractional(&self, offset: f64) -> Result<NaiveDateTime> {
        if offset.fract() == 0.0 && offset.abs() < i64::MAX as f64 {
            return self.decode(offset as i64);
        }

        let nanos = offset * self.unit.nanoseconds() as f64;
        if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
            return Err(DatasetError::invalid_metadata(format!(
                "time offset {} {} out of range",
                offset,
                self.unit.as_str()
            )));
        }

        self.epoch
            .checked_add_signed(Duration::nanoseconds(nanos.round() as i64))
            .ok_or_else(|| {
                DatasetError::invalid_metadata(format!("time offset {} out of range", offset))
            })
    }

    /// Convert a timestamp to an offset; fails unless the offset is a whole number of units.
    pub fn encode(&self, time: NaiveDateTime) -> Result<i64> {
        let delta = time.signed_duration_since(self.epoch);
        self.unit
            .count(delta)
            .filter(|&n| self.unit.duration(n) == Some(delta))
            .ok_or_else(|| {
                DatasetError::invalid_definition(format!(
                    "{} is not a whole number of {} since {}",
                    time,
                    self.unit.as_str(),
                    self.epoch
                ))
            })
    }
}

/// Parse a date or datetime query string.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` (or with a space separator)
/// and RFC 3339 timestamps, which are converted to UTC.
pub fn parse_time(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ndt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            DatasetError::InvalidTime(format!("could not parse '{}' as a date or datetime", s))
        })
}

/// Render a timestamp the way it appears in responses.
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format("%Y-%m-%dT%H:%M:%S").to_string()
}
