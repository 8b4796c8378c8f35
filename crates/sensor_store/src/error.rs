//! Store error types

use contracts::{AcquireError, ContractError};
use thiserror::Error;

/// Failure of `LiveSensorStore::capture_from`
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The handle failed to produce a reading
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    /// The store rejected the reading (unknown type)
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Store Result alias
pub type Result<T> = std::result::Result<T, ContractError>;
