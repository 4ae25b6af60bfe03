//! Sensor telemetry analysis engine.
//!
//! This module contains:
//! - Gradient annotation of raw series at ingestion
//! - Time-range selection and positional downsampling for data queries
//! - Threshold configuration and anomaly interval detection

pub mod anomaly;
pub mod downsample;
pub mod error;
pub mod gradient;
pub mod query;
pub mod range;
pub mod sample;
pub mod threshold;

// Re-export commonly used types
pub use anomaly::{detect, Anomaly, AnomalyKind, AnomalyScanner};
pub use downsample::{decimate, Density};
pub use error::{EngineError, EngineResult};
pub use gradient::{annotate, round5};
pub use query::{AnomalyQuery, DataQuery, QueryOptions};
pub use range::{EndBound, TimeRange, DEFAULT_LIMIT};
pub use sample::{format_timestamp, parse_timestamp, RawSample, Sample, TIMESTAMP_FORMAT};
pub use threshold::{SensorConfig, SensorUpdate, Thresholds};
