//! Telemetry sample types.
//!
//! A sensor's samples form an append-only series ordered strictly ascending by
//! timestamp. The gradient is fixed once at ingestion against the full series.

use crate::core::error::{EngineError, EngineResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Literal timestamp format used on the wire (no offset, UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One telemetry reading with its derived gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Store-assigned identifier
    pub id: u64,
    /// Owning sensor
    pub sensor_id: u32,
    /// Measured value
    pub value: f64,
    /// Rate of change per second relative to the preceding sample
    pub gradient: f64,
    /// Measurement instant (second resolution)
    pub date: DateTime<Utc>,
}

/// A reading as delivered to ingestion, before the gradient is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub value: f64,
    #[serde(with = "literal_timestamp")]
    pub date: DateTime<Utc>,
}

impl RawSample {
    pub fn new(value: f64, date: DateTime<Utc>) -> Self {
        Self { value, date }
    }
}

/// Parse a `YYYY-MM-DD HH:MM:SS` literal as a UTC instant.
///
/// `param` names the query parameter or field for the error message.
pub fn parse_timestamp(param: &str, literal: &str) -> EngineResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(literal, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| EngineError::invalid(param, literal, e.to_string()))
}

/// Render an instant in the literal wire format.
pub fn format_timestamp(date: DateTime<Utc>) -> String {
    date.format(TIMESTAMP_FORMAT).to_string()
}

/// Serde support for literal timestamps in dataset files.
mod literal_timestamp {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_timestamp(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let literal = String::deserialize(deserializer)?;
        parse_timestamp("date", &literal).map_err(D::Error::custom)
    }
}
