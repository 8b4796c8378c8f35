//! Sensors error types

use std::path::PathBuf;

use contracts::{InitError, SensorType};
use thiserror::Error;

/// Sensors specific error
#[derive(Debug, Error)]
pub enum SensorsError {
    /// No concrete handle exists for this sensor type
    #[error("no handle available for sensor type '{sensor_type}'")]
    UnsupportedSensorType { sensor_type: SensorType },

    /// Recording file could not be read
    #[error("failed to read recording '{}': {source}", path.display())]
    RecordingIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Recording line is not a valid record
    #[error("invalid record at {}:{line}: {source}", path.display())]
    RecordingParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Recording holds no records
    #[error("recording '{}' contains no records", path.display())]
    EmptyRecording { path: PathBuf },
}

impl SensorsError {
    /// Create recording IO error
    pub fn recording_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::RecordingIo {
            path: path.into(),
            source,
        }
    }
}

impl From<SensorsError> for InitError {
    fn from(err: SensorsError) -> Self {
        InitError::device(err.to_string())
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, SensorsError>;
