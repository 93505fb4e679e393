//! Error types for Sensekit

use crate::types::SensorType;
use thiserror::Error;

/// Errors surfaced by registry lookups and sensor lifecycle operations
#[derive(Debug, Error)]
pub enum SenseError {
    #[error("Unknown sensor type code: {0}")]
    UnknownSensorType(i32),

    #[error("Unknown sensor name: {0}")]
    UnknownSensorName(String),

    #[error("{sensor_type} sensor: permission not granted: {permission}")]
    PermissionDenied {
        sensor_type: SensorType,
        permission: String,
    },

    #[error("No data classifier defined for sensor type {0}")]
    ClassifierUnsupported(SensorType),

    #[error("Platform cannot provide a source for {sensor_type}: {reason}")]
    SourceUnavailable {
        sensor_type: SensorType,
        reason: String,
    },
}
