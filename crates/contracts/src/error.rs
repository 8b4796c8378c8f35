//! Layered error definitions
//!
//! Categorized by source: config / store / geometry

use thiserror::Error;

use crate::SensorType;

/// Unified error type for programmer and configuration errors.
///
/// These fail fast and are surfaced to the caller; none of them is retried.
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Store Errors =====
    /// No sequence has been registered for this sensor type
    #[error("unknown sensor type: {sensor_type}")]
    UnknownSensorType { sensor_type: SensorType },

    /// A reading would break the per-type frame id / timestamp ordering
    #[error(
        "out-of-order reading for '{sensor_type}': frame_id {frame_id} after {last_frame_id}"
    )]
    OutOfOrder {
        sensor_type: SensorType,
        frame_id: u64,
        last_frame_id: u64,
    },

    /// Eviction interval must be strictly positive
    #[error("invalid clear interval for '{sensor_type}': {interval_ms}ms")]
    InvalidInterval {
        sensor_type: SensorType,
        interval_ms: u128,
    },

    // ===== Geometry Errors =====
    /// Translation/rotation of the wrong shape
    #[error("dimension mismatch for {field}: expected {expected}, got {actual}")]
    DimensionMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unknown sensor type error
    pub fn unknown_sensor_type(sensor_type: SensorType) -> Self {
        Self::UnknownSensorType { sensor_type }
    }

    /// Create dimension mismatch error
    pub fn dimension_mismatch(
        field: &'static str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::DimensionMismatch {
            field,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
