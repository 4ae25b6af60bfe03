//! JSON dataset used to seed an in-memory store.
//!
//! ```json
//! {
//!   "sensors": [
//!     {
//!       "id": 1,
//!       "name": "Flow Sensor",
//!       "measurement_unit": "°C",
//!       "lower_bound": 7.81,
//!       "samples": [{ "value": 7.836, "date": "2020-01-01 00:00:00" }]
//!     }
//!   ]
//! }
//! ```

use crate::core::{RawSample, SensorConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// A set of sensors with their raw readings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub sensors: Vec<SensorSeed>,
}

/// One sensor's configuration and its raw, ascending readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSeed {
    #[serde(flatten)]
    pub config: SensorConfig,
    #[serde(default)]
    pub samples: Vec<RawSample>,
}

impl Dataset {
    /// Load a dataset from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse a dataset from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Total number of raw readings across all sensors.
    pub fn sample_count(&self) -> usize {
        self.sensors.iter().map(|s| s.samples.len()).sum()
    }
}

/// Dataset loading errors.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] crate::core::EngineError),
}
