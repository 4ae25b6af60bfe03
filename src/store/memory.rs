//! In-memory sensor repository.

use super::dataset::{Dataset, DatasetError};
use super::SensorRepository;
use crate::core::{annotate, EngineError, EngineResult, RawSample, Sample, SensorConfig, TimeRange};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
struct SensorEntry {
    config: SensorConfig,
    /// Gradient-annotated, ascending
    samples: Vec<Sample>,
}

#[derive(Debug)]
struct Inner {
    sensors: BTreeMap<u32, SensorEntry>,
    next_sample_id: u64,
}

/// Thread-safe in-memory store. Samples are annotated with gradients on insert.
#[derive(Debug)]
pub struct InMemoryRepository {
    inner: RwLock<Inner>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                sensors: BTreeMap::new(),
                next_sample_id: 1,
            }),
        }
    }

    /// Build a repository from every sensor in a dataset.
    pub fn from_dataset(dataset: Dataset) -> Result<Self, DatasetError> {
        let repo = Self::new();
        for seed in dataset.sensors {
            repo.insert_sensor(seed.config, &seed.samples)?;
        }
        Ok(repo)
    }

    /// Ingest a sensor and its raw readings, replacing any sensor with the same id.
    ///
    /// Returns the number of samples stored. A series that is not strictly
    /// ascending is rejected and nothing is stored.
    pub fn insert_sensor(&self, config: SensorConfig, raw: &[RawSample]) -> EngineResult<usize> {
        let mut inner = self.write()?;

        let samples = annotate(config.id, inner.next_sample_id, raw)?;
        inner.next_sample_id += samples.len() as u64;

        let count = samples.len();
        tracing::info!(sensor_id = config.id, samples = count, "sensor ingested");
        inner
            .sensors
            .insert(config.id, SensorEntry { config, samples });

        Ok(count)
    }

    /// Number of sensors held.
    pub fn sensor_count(&self) -> usize {
        self.read().map(|inner| inner.sensors.len()).unwrap_or(0)
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| EngineError::Storage("repository lock poisoned".to_string()))
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| EngineError::Storage("repository lock poisoned".to_string()))
    }
}

fn not_found(sensor_id: u32) -> EngineError {
    EngineError::SensorNotFound(sensor_id.to_string())
}

impl SensorRepository for InMemoryRepository {
    fn list_sensors(&self) -> EngineResult<Vec<SensorConfig>> {
        Ok(self
            .read()?
            .sensors
            .values()
            .map(|entry| entry.config.clone())
            .collect())
    }

    fn fetch_config(&self, sensor_id: u32) -> EngineResult<SensorConfig> {
        self.read()?
            .sensors
            .get(&sensor_id)
            .map(|entry| entry.config.clone())
            .ok_or_else(|| not_found(sensor_id))
    }

    fn store_config(&self, sensor_id: u32, config: &SensorConfig) -> EngineResult<()> {
        let mut inner = self.write()?;
        let entry = inner
            .sensors
            .get_mut(&sensor_id)
            .ok_or_else(|| not_found(sensor_id))?;
        entry.config = SensorConfig {
            id: sensor_id,
            ..config.clone()
        };
        Ok(())
    }

    fn fetch_samples(&self, sensor_id: u32, range: &TimeRange) -> EngineResult<Vec<Sample>> {
        let inner = self.read()?;
        let entry = inner
            .sensors
            .get(&sensor_id)
            .ok_or_else(|| not_found(sensor_id))?;
        Ok(range.window(&entry.samples).to_vec())
    }

    fn latest_sample(&self, sensor_id: u32) -> EngineResult<Option<Sample>> {
        let inner = self.read()?;
        let entry = inner
            .sensors
            .get(&sensor_id)
            .ok_or_else(|| not_found(sensor_id))?;
        Ok(entry.samples.last().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn raw(values: &[f64]) -> Vec<RawSample> {
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| RawSample::new(v, t0 + Duration::minutes(i as i64)))
            .collect()
    }

    #[test]
    fn test_insert_and_fetch() {
        let repo = InMemoryRepository::new();
        let stored = repo
            .insert_sensor(SensorConfig::new(1, "Flow Sensor"), &raw(&[7.836, 7.856, 7.8]))
            .unwrap();
        assert_eq!(stored, 3);

        let samples = repo.fetch_samples(1, &TimeRange::all()).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[2].gradient, -0.00093);

        let latest = repo.latest_sample(1).unwrap().unwrap();
        assert_eq!(latest.value, 7.8);
    }

    #[test]
    fn test_sample_ids_are_global() {
        let repo = InMemoryRepository::new();
        repo.insert_sensor(SensorConfig::new(1, "a"), &raw(&[1.0, 2.0]))
            .unwrap();
        repo.insert_sensor(SensorConfig::new(2, "b"), &raw(&[3.0]))
            .unwrap();

        let b = repo.fetch_samples(2, &TimeRange::all()).unwrap();
        assert_eq!(b[0].id, 3);
        assert_eq!(b[0].sensor_id, 2);
    }

    #[test]
    fn test_unknown_sensor() {
        let repo = InMemoryRepository::new();
        assert_eq!(
            repo.fetch_config(13).unwrap_err(),
            EngineError::SensorNotFound("13".into())
        );
        assert!(repo.fetch_samples(13, &TimeRange::all()).is_err());
        assert!(repo.latest_sample(13).is_err());
        assert!(repo
            .store_config(13, &SensorConfig::new(13, "x"))
            .is_err());
    }

    #[test]
    fn test_rejected_series_is_not_stored() {
        let repo = InMemoryRepository::new();
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let duplicate = vec![RawSample::new(1.0, t0), RawSample::new(2.0, t0)];

        let err = repo
            .insert_sensor(SensorConfig::new(1, "dup"), &duplicate)
            .unwrap_err();
        assert!(matches!(err, EngineError::NonAscendingTimestamps { .. }));
        assert_eq!(repo.sensor_count(), 0);
    }

    #[test]
    fn test_store_config_keeps_id() {
        let repo = InMemoryRepository::new();
        repo.insert_sensor(SensorConfig::new(1, "a"), &[]).unwrap();

        let mut config = SensorConfig::new(99, "renamed");
        config.thresholds.lower_bound = Some(1.0);
        repo.store_config(1, &config).unwrap();

        let stored = repo.fetch_config(1).unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(stored.thresholds.lower_bound, Some(1.0));
        assert_eq!(repo.latest_sample(1).unwrap(), None);
    }

    #[test]
    fn test_from_dataset() {
        let dataset = Dataset::from_json(
            r#"{"sensors": [
                {"id": 2, "name": "b", "samples": [{"value": 1.0, "date": "2020-01-01 00:00:00"}]},
                {"id": 1, "name": "a"}
            ]}"#,
        )
        .unwrap();
        let repo = InMemoryRepository::from_dataset(dataset).unwrap();

        let ids: Vec<u32> = repo.list_sensors().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
