//! Sensor Telemetry - analysis engine for building sensor time series.
//!
//! Each sensor reports a scalar reading at irregular intervals. At ingestion
//! every sample is annotated with its rate of change against the previous
//! sample. Queries then select samples by time window, cap and thin them for
//! display, or scan them for intervals where a reading or its rate of change
//! crosses the sensor's configured limits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Sensor Telemetry                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │   Dataset   │──▶│  Gradient   │──▶│ Repository  │        │
//! │  │   (JSON)    │   │ (annotate)  │   │ (in-memory) │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                                             │               │
//! │                    ┌────────────────────────┼──────┐        │
//! │                    ▼                        ▼      ▼        │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │ TimeRange + │   │   Anomaly   │   │  Threshold  │        │
//! │  │ Downsample  │   │  Detection  │   │   Updates   │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         └──────────────────┴──────────────────┘             │
//! │                     TelemetryService                        │
//! │                 (HTTP server / CLI output)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sensor_telemetry::{Dataset, DataQuery, InMemoryRepository, TelemetryService};
//! use std::path::Path;
//!
//! let dataset = Dataset::load(Path::new("data/sample-dataset.json")).expect("dataset");
//! let repository = InMemoryRepository::from_dataset(dataset).expect("ingest");
//! let service = TelemetryService::new(repository);
//!
//! let samples = service.query_data("1", &DataQuery::default()).expect("query");
//! println!("{} samples", samples.len());
//! ```

pub mod config;
pub mod core;
pub mod service;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{
    detect, Anomaly, AnomalyKind, AnomalyQuery, DataQuery, Density, EndBound, EngineError,
    EngineResult, QueryOptions, RawSample, Sample, SensorConfig, SensorUpdate, Thresholds,
    TimeRange,
};
pub use service::{SensorView, TelemetryService};
pub use store::{Dataset, DatasetError, InMemoryRepository, SensorRepository};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
