//! Request flows over the engine.
//!
//! ```text
//! data query:      repository ──→ TimeRange::resolve ──→ decimate ──→ caller
//! anomaly query:   repository (window) ──→ detect(thresholds) ──→ caller
//! config update:   repository ──→ SensorUpdate::from_json ──→ merge ──→ repository
//! ```
//!
//! Every invocation owns its own cursors and trackers, so concurrent queries
//! share nothing but the repository.

use crate::core::{
    decimate, detect, Anomaly, AnomalyQuery, DataQuery, EngineError, EngineResult, Sample,
    SensorConfig, SensorUpdate,
};
use crate::store::SensorRepository;
use serde::{Deserialize, Serialize};

/// A sensor's configuration together with its most recent sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorView {
    #[serde(flatten)]
    pub config: SensorConfig,
    pub latest_data: Option<Sample>,
}

/// Telemetry queries and configuration updates against a repository.
#[derive(Debug, Clone)]
pub struct TelemetryService<R> {
    repository: R,
}

impl<R: SensorRepository> TelemetryService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// All sensors with their latest sample.
    pub fn sensors(&self) -> EngineResult<Vec<SensorView>> {
        self.repository
            .list_sensors()?
            .into_iter()
            .map(|config| self.view(config))
            .collect()
    }

    /// One sensor with its latest sample.
    pub fn sensor(&self, sensor_id: &str) -> EngineResult<SensorView> {
        let id = parse_sensor_id(sensor_id)?;
        let config = self.repository.fetch_config(id)?;
        self.view(config)
    }

    /// A sensor's stored configuration, without its latest sample.
    pub fn sensor_config(&self, sensor_id: &str) -> EngineResult<SensorConfig> {
        let id = parse_sensor_id(sensor_id)?;
        self.repository.fetch_config(id)
    }

    /// Samples of a sensor selected by time range, capped and decimated.
    pub fn query_data(&self, sensor_id: &str, query: &DataQuery) -> EngineResult<Vec<Sample>> {
        let id = parse_sensor_id(sensor_id)?;
        let samples = self.repository.fetch_samples(id, &query.range)?;
        let selected = query.range.resolve(&samples, query.limit);
        let result = decimate(selected, query.density);

        tracing::debug!(
            sensor_id = id,
            fetched = samples.len(),
            returned = result.len(),
            density = query.density.get(),
            "data query"
        );

        Ok(result)
    }

    /// Anomaly intervals of a sensor within the requested window.
    pub fn query_anomalies(
        &self,
        sensor_id: &str,
        query: &AnomalyQuery,
    ) -> EngineResult<Vec<Anomaly>> {
        let id = parse_sensor_id(sensor_id)?;
        let config = self.repository.fetch_config(id)?;
        let samples = self.repository.fetch_samples(id, &query.range)?;
        let anomalies = detect(&samples, &config.thresholds);

        tracing::debug!(sensor_id = id, anomalies = anomalies.len(), "anomaly query");

        Ok(anomalies)
    }

    /// Validate and merge a partial update, returning the post-update view.
    ///
    /// The sensor must exist before the payload is looked at. A rejected
    /// payload leaves the stored configuration untouched.
    pub fn update_sensor(
        &self,
        sensor_id: &str,
        payload: &serde_json::Value,
    ) -> EngineResult<SensorView> {
        let id = parse_sensor_id(sensor_id)?;
        let mut config = self.repository.fetch_config(id)?;
        let update = SensorUpdate::from_json(payload)?;

        if !update.is_empty() {
            config.apply(&update);
            self.repository.store_config(id, &config)?;
            tracing::info!(sensor_id = id, ?update, "sensor configuration updated");
        }

        self.view(config)
    }

    fn view(&self, config: SensorConfig) -> EngineResult<SensorView> {
        let latest_data = self.repository.latest_sample(config.id)?;
        Ok(SensorView {
            config,
            latest_data,
        })
    }
}

/// Sensor ids arrive as path strings; anything non-numeric cannot exist.
fn parse_sensor_id(raw: &str) -> EngineResult<u32> {
    raw.parse()
        .map_err(|_| EngineError::SensorNotFound(raw.to_string()))
}
