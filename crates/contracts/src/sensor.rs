//! SensorReading - LiveSensorStore entry
//!
//! One timestamped, frame-identified unit of data from one sensor source.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::PoseChange;

/// Store-assigned frame identifier, monotonically increasing per sensor type.
pub type FrameId = u64;

/// Shared, immutable point cloud in the sensor (vehicle) frame.
pub type PointCloud = Arc<[Point3<f64>]>;

/// Logical category of data source.
///
/// The key used to partition the live store and the eviction schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    StereoCamera,
    Imu,
    Gnss,
}

impl SensorType {
    /// Stable snake_case name, matches the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::StereoCamera => "stereo_camera",
            SensorType::Imu => "imu",
            SensorType::Gnss => "gnss",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reading held by the live store.
///
/// Immutable once created; cloning only bumps reference counts on the payload.
#[derive(Debug, Clone)]
pub struct SensorReading {
    /// Sensor category this reading belongs to
    pub sensor_type: SensorType,

    /// Position within this sensor type's stream
    pub frame_id: FrameId,

    /// Monotonic capture instant
    pub timestamp: Instant,

    /// Data payload (opaque to the store)
    pub payload: SensorPayload,
}

impl SensorReading {
    pub fn new(
        sensor_type: SensorType,
        frame_id: FrameId,
        timestamp: Instant,
        payload: SensorPayload,
    ) -> Self {
        Self {
            sensor_type,
            frame_id,
            timestamp,
            payload,
        }
    }

    /// Stereo measurement carried by this reading, if any.
    pub fn stereo(&self) -> Option<&StereoMeasurement> {
        match &self.payload {
            SensorPayload::Stereo(measurement) => Some(measurement),
            SensorPayload::Raw(_) => None,
        }
    }
}

/// Sensor data payload
#[derive(Debug, Clone)]
pub enum SensorPayload {
    /// Calibrated point cloud + odometry estimate for one frame pair
    Stereo(StereoMeasurement),

    /// Raw bytes (fallback for sensor types without a decoded form)
    Raw(Bytes),
}

/// Output of the stereo capability for one left/right frame pair.
#[derive(Debug, Clone)]
pub struct StereoMeasurement {
    /// Reprojected points, vehicle frame
    pub point_cloud: PointCloud,

    /// Motion since the previous frame pair, expressed in the vehicle frame
    pub odometry: PoseChange,

    /// Rectified image size the disparity was computed on
    pub image_size: ImageSize,
}

impl StereoMeasurement {
    pub fn new(point_cloud: Vec<Point3<f64>>, odometry: PoseChange, image_size: ImageSize) -> Self {
        Self {
            point_cloud: point_cloud.into(),
            odometry,
            image_size,
        }
    }
}

/// Image dimensions in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Last-known connection status of one sensor handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    /// Registered but `initialize` has not run yet
    Uninitialized,
    /// Last probe reported the sensor connected
    Connected,
    /// Last probe reported the sensor disconnected
    Disconnected,
    /// Initialization failed
    Failed,
    /// Resources released
    ShutDown,
}

impl SensorStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, SensorStatus::Connected)
    }
}
