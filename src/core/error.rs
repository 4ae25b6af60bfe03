//! Error types for the telemetry analysis engine.
//!
//! Every failure is a local, synchronous return carrying enough context
//! (parameter name, offending value, sensor identifier) for the caller to
//! build a user-facing message.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced by the engine and its repository seam.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A query parameter or update field failed validation.
    #[error("Error parsing parameter '{param}' with value '{value}': {reason}")]
    InvalidParameter {
        param: String,
        value: String,
        reason: String,
    },

    /// The update payload is not a JSON object (or not JSON at all).
    #[error("Invalid update payload: {0}")]
    InvalidPayload(String),

    /// The sensor identifier does not resolve in the store.
    #[error("Sensor '{0}' not found.")]
    SensorNotFound(String),

    /// Two consecutive raw samples are not strictly ascending in time.
    #[error("Sensor {sensor_id}: sample {index} at {date} does not follow its predecessor in time")]
    NonAscendingTimestamps {
        sensor_id: u32,
        index: usize,
        date: DateTime<Utc>,
    },

    /// Unexpected failure in the storage collaborator.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Shorthand for a validation failure on a named parameter.
    pub fn invalid(
        param: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status code equivalent of this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidParameter { .. } | Self::InvalidPayload(_) => 400,
            Self::SensorNotFound(_) => 404,
            Self::NonAscendingTimestamps { .. } => 422,
            Self::Storage(_) => 500,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::SensorNotFound(_) => "NOT_FOUND",
            Self::NonAscendingTimestamps { .. } => "INVALID_SERIES",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether this is a validation failure (as opposed to not-found or storage).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. } | Self::InvalidPayload(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = EngineError::invalid("density", "17", "must be between 1 and 16");
        assert_eq!(
            err.to_string(),
            "Error parsing parameter 'density' with value '17': must be between 1 and 16"
        );

        let err = EngineError::SensorNotFound("13".into());
        assert_eq!(err.to_string(), "Sensor '13' not found.");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(EngineError::invalid("limit", "0", "x").status_code(), 400);
        assert_eq!(EngineError::InvalidPayload("x".into()).status_code(), 400);
        assert_eq!(EngineError::SensorNotFound("1".into()).status_code(), 404);
        assert_eq!(EngineError::Storage("x".into()).status_code(), 500);
        assert_eq!(EngineError::SensorNotFound("1".into()).code(), "NOT_FOUND");
        assert!(EngineError::InvalidPayload("x".into()).is_validation());
        assert!(!EngineError::Storage("x".into()).is_validation());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineError>();
    }
}
