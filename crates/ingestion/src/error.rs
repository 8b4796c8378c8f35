//! Registry error types

use std::time::Duration;

use contracts::{AcquireError, ContractError, InitError, SensorStatus, SensorType};
use thiserror::Error;

/// Registry error
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A handle for this sensor type is already registered
    #[error("sensor type '{sensor_type}' is already registered")]
    DuplicateSensor {
        /// Sensor type
        sensor_type: SensorType,
    },

    /// Acquisition timeout must be strictly positive
    #[error("acquire timeout for '{sensor_type}' must be > 0")]
    InvalidTimeout {
        /// Sensor type
        sensor_type: SensorType,
    },

    /// Handle initialization failed
    #[error("failed to initialize '{sensor_type}': {source}")]
    Init {
        /// Sensor type
        sensor_type: SensorType,
        #[source]
        source: InitError,
    },

    /// Handle reported disconnected; the read was not attempted
    #[error("sensor '{sensor_type}' disconnected")]
    SensorDisconnected {
        /// Sensor type
        sensor_type: SensorType,
    },

    /// Handle is not in a readable state (uninitialized, failed, shut down)
    #[error("sensor '{sensor_type}' is not ready (status: {status:?})")]
    NotReady {
        /// Sensor type
        sensor_type: SensorType,
        /// Cached status
        status: SensorStatus,
    },

    /// Acquisition exceeded its timeout
    #[error("acquisition from '{sensor_type}' timed out after {timeout:?}")]
    AcquireTimeout {
        /// Sensor type
        sensor_type: SensorType,
        /// Configured bound
        timeout: Duration,
    },

    /// Acquisition failed
    #[error("acquisition from '{sensor_type}' failed: {source}")]
    Acquire {
        /// Sensor type
        sensor_type: SensorType,
        #[source]
        source: AcquireError,
    },

    /// Store contract violation (unknown type, ordering)
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl RegistryError {
    /// Whether the failure is local to one read and the next cycle may retry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RegistryError::AcquireTimeout { .. } | RegistryError::Acquire { .. }
        )
    }

    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::DuplicateSensor { .. } => "duplicate_sensor",
            RegistryError::InvalidTimeout { .. } => "invalid_timeout",
            RegistryError::Init { .. } => "init_failed",
            RegistryError::SensorDisconnected { .. } => "disconnected",
            RegistryError::NotReady { .. } => "not_ready",
            RegistryError::AcquireTimeout { .. } => "timeout",
            RegistryError::Acquire { .. } => "acquire_failed",
            RegistryError::Contract(_) => "contract",
        }
    }

    pub(crate) fn unknown_sensor_type(sensor_type: SensorType) -> Self {
        RegistryError::Contract(ContractError::unknown_sensor_type(sensor_type))
    }
}

/// Registry Result alias
pub type Result<T> = std::result::Result<T, RegistryError>;
