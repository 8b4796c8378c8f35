//! Pipeline error types

use contracts::{ContractError, InitError, SensorType};
use ingestion::RegistryError;
use thiserror::Error;

use crate::state::PipelineState;

/// Pipeline error
///
/// Read failures and timeouts inside a cycle are recovered as skipped
/// cycles. Anything else returned from a cycle has already stopped the
/// pipeline with [`StopReason::Fault`](crate::StopReason::Fault).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The driving sensor could not be initialized or connected
    #[error("initialization failed for '{sensor_type}': {reason}")]
    InitializationFailed {
        sensor_type: SensorType,
        reason: String,
        #[source]
        source: Option<InitError>,
    },

    /// Operation not valid in the current state
    #[error("pipeline is {state}, expected {expected}")]
    InvalidState {
        state: PipelineState,
        expected: PipelineState,
    },

    /// Configuration or programmer error
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Registry misuse (e.g. unknown sensor type)
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl PipelineError {
    pub fn initialization_failed(sensor_type: SensorType, reason: impl Into<String>) -> Self {
        Self::InitializationFailed {
            sensor_type,
            reason: reason.into(),
            source: None,
        }
    }
}

/// Pipeline Result alias
pub type Result<T> = std::result::Result<T, PipelineError>;
