//! Per-sensor threshold configuration and partial updates.
//!
//! Each bound is optional; an unset bound disables its anomaly class. Updates
//! arrive as a sparse JSON object: recognized fields are type-checked as a
//! whole before anything is applied, unrecognized fields are dropped.

use crate::core::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Anomaly thresholds. `None` disables the corresponding class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub upper_bound: Option<f64>,
    pub lower_bound: Option<f64>,
    pub gradient_bound: Option<f64>,
}

/// Sensor configuration: descriptive metadata plus thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub id: u32,
    #[serde(default)]
    pub room_model_id: u32,
    /// Identifier of the mesh representing the sensor in the room model
    #[serde(default)]
    pub mesh_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub measurement_unit: String,
    #[serde(flatten)]
    pub thresholds: Thresholds,
}

impl SensorConfig {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            room_model_id: 0,
            mesh_id: None,
            name: name.into(),
            description: String::new(),
            measurement_unit: String::new(),
            thresholds: Thresholds::default(),
        }
    }

    /// Merge a validated update. Fields absent from the update keep their value.
    pub fn apply(&mut self, update: &SensorUpdate) {
        if let Some(mesh_id) = &update.mesh_id {
            self.mesh_id = Some(mesh_id.clone());
        }
        if let Some(bound) = update.lower_bound {
            self.thresholds.lower_bound = bound;
        }
        if let Some(bound) = update.upper_bound {
            self.thresholds.upper_bound = bound;
        }
        if let Some(bound) = update.gradient_bound {
            self.thresholds.gradient_bound = bound;
        }
    }
}

/// A validated partial update.
///
/// For the bounds, the outer `Option` is presence and the inner one is the
/// value: `Some(None)` explicitly unsets the bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorUpdate {
    pub mesh_id: Option<String>,
    pub lower_bound: Option<Option<f64>>,
    pub upper_bound: Option<Option<f64>>,
    pub gradient_bound: Option<Option<f64>>,
}

impl SensorUpdate {
    /// Validate a JSON payload into an update.
    pub fn from_json(payload: &Value) -> EngineResult<Self> {
        let fields = payload.as_object().ok_or_else(|| {
            EngineError::InvalidPayload(format!("expected a JSON object, got {payload}"))
        })?;
        Self::from_fields(fields)
    }

    fn from_fields(fields: &Map<String, Value>) -> EngineResult<Self> {
        let mut update = Self::default();

        for (key, value) in fields {
            match key.as_str() {
                "mesh_id" => {
                    let mesh_id = value
                        .as_str()
                        .ok_or_else(|| EngineError::invalid(key, value.to_string(), "expected a string"))?;
                    update.mesh_id = Some(mesh_id.to_string());
                }
                "lower_bound" => update.lower_bound = Some(parse_bound(key, value)?),
                "upper_bound" => update.upper_bound = Some(parse_bound(key, value)?),
                "gradient_bound" => update.gradient_bound = Some(parse_bound(key, value)?),
                _ => tracing::debug!(field = %key, "ignoring unrecognized update field"),
            }
        }

        Ok(update)
    }

    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A bound is a number or `null` (unset).
fn parse_bound(key: &str, value: &Value) -> EngineResult<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| EngineError::invalid(key, value.to_string(), "number out of range")),
        _ => Err(EngineError::invalid(
            key,
            value.to_string(),
            "expected a number or null",
        )),
    }
}
