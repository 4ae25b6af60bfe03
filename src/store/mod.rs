//! Storage seam for sensors, their configuration and their samples.
//!
//! The engine never talks to a storage technology directly; it goes through
//! [`SensorRepository`]. An in-memory implementation seeded from a JSON
//! dataset is provided for the server and the CLI.

pub mod dataset;
pub mod memory;

use crate::core::{EngineResult, Sample, SensorConfig, TimeRange};
use std::sync::Arc;

pub use dataset::{Dataset, DatasetError, SensorSeed};
pub use memory::InMemoryRepository;

/// Narrow repository interface required by the engine.
///
/// Every per-sensor method reports an unknown sensor as
/// [`EngineError::SensorNotFound`](crate::core::EngineError::SensorNotFound).
pub trait SensorRepository: Send + Sync {
    /// All sensors, ordered by id.
    fn list_sensors(&self) -> EngineResult<Vec<SensorConfig>>;

    /// Current configuration of one sensor.
    fn fetch_config(&self, sensor_id: u32) -> EngineResult<SensorConfig>;

    /// Replace a sensor's configuration (last writer wins).
    fn store_config(&self, sensor_id: u32, config: &SensorConfig) -> EngineResult<()>;

    /// Samples inside `range`, ascending by timestamp.
    fn fetch_samples(&self, sensor_id: u32, range: &TimeRange) -> EngineResult<Vec<Sample>>;

    /// Most recent sample, if the sensor has any.
    fn latest_sample(&self, sensor_id: u32) -> EngineResult<Option<Sample>>;
}

impl<R: SensorRepository + ?Sized> SensorRepository for Arc<R> {
    fn list_sensors(&self) -> EngineResult<Vec<SensorConfig>> {
        (**self).list_sensors()
    }

    fn fetch_config(&self, sensor_id: u32) -> EngineResult<SensorConfig> {
        (**self).fetch_config(sensor_id)
    }

    fn store_config(&self, sensor_id: u32, config: &SensorConfig) -> EngineResult<()> {
        (**self).store_config(sensor_id, config)
    }

    fn fetch_samples(&self, sensor_id: u32, range: &TimeRange) -> EngineResult<Vec<Sample>> {
        (**self).fetch_samples(sensor_id, range)
    }

    fn latest_sample(&self, sensor_id: u32) -> EngineResult<Option<Sample>> {
        (**self).latest_sample(sensor_id)
    }
}
