//! SensorHandle trait - sensor capability abstraction
//!
//! Defines the interface every physical or logical sensor exposes to the
//! registry: initialize, acquire one reading, probe the connection, shut down.

use thiserror::Error;

use crate::{SensorPayload, SensorType};

/// Store-side hook handed to a sensor during initialization.
///
/// Lets the handle register the reading history for its own sensor type
/// without depending on the concrete store.
pub trait ReadingRegistrar {
    /// Register an (empty) reading sequence; re-registering keeps existing history.
    fn register_sensor_type(&mut self, sensor_type: SensorType);

    /// Whether a sequence exists for `sensor_type`
    fn is_registered(&self, sensor_type: SensorType) -> bool;
}

/// Sensor capability trait
///
/// Abstracts the stereo camera and any future sensor variant behind one
/// interface, so the registry and the processing pipeline never depend on a
/// concrete device.
///
/// # Contract
///
/// 1. `initialize` must succeed before `acquire` is called
/// 2. `acquire` is the only suspension point; callers bound it with a timeout
/// 3. `check_connection` is a live probe and must not block
/// 4. `shutdown` releases device resources
///
/// # Example
///
/// ```ignore
/// let mut handle = StereoCameraHandle::new(rig);
/// handle.initialize(&mut store)?;
/// if handle.check_connection() {
///     let payload = handle.acquire().await?;
/// }
/// handle.shutdown();
/// ```
#[trait_variant::make(SensorHandle: Send)]
pub trait LocalSensorHandle {
    /// Sensor category served by this handle
    fn sensor_type(&self) -> SensorType;

    /// Prepare the device and register this sensor's history with `registrar`.
    ///
    /// # Errors
    /// [`InitError`] if the device cannot be opened or calibrated
    fn initialize(&mut self, registrar: &mut dyn ReadingRegistrar) -> Result<(), InitError>;

    /// Acquire and process one reading.
    ///
    /// # Errors
    /// [`AcquireError`] for a failed grab or a failed derivation (e.g. disparity)
    async fn acquire(&mut self) -> Result<SensorPayload, AcquireError>;

    /// Probe whether the device is still reachable
    fn check_connection(&self) -> bool;

    /// Release device resources
    fn shutdown(&mut self);
}

/// Sensor initialization failure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InitError {
    /// Device could not be opened
    #[error("device error: {message}")]
    Device { message: String },

    /// Calibration could not be obtained or is invalid
    #[error("calibration failed: {message}")]
    Calibration { message: String },

    /// Device opened but reports no connection
    #[error("sensor not connected")]
    NotConnected,
}

impl InitError {
    pub fn device(message: impl Into<String>) -> Self {
        Self::Device {
            message: message.into(),
        }
    }

    pub fn calibration(message: impl Into<String>) -> Self {
        Self::Calibration {
            message: message.into(),
        }
    }
}

/// Single-acquisition failure; recovered by skipping the cycle
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AcquireError {
    /// Frame grab failed
    #[error("frame grab failed: {message}")]
    Grab { message: String },

    /// Point cloud / odometry derivation failed
    #[error("stereo processing failed: {message}")]
    Processing { message: String },

    /// `acquire` called before a successful `initialize`
    #[error("sensor not initialized")]
    NotInitialized,
}

impl AcquireError {
    pub fn grab(message: impl Into<String>) -> Self {
        Self::Grab {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing {
            message: message.into(),
        }
    }
}
