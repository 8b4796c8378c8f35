//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace:
//! the sensor data model, the pose/map result types, the sensor and
//! stop-signal capabilities, and the configuration tree.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `tokio::time::Instant` is the monotonic clock for every reading
//! - `frame_id` is assigned per sensor type by the live store, starting at 0

mod blueprint;
mod calibration;
mod error;
mod geometry;
mod sensor;
mod sensor_handle;
mod stop;

pub use blueprint::*;
pub use calibration::StereoCalibration;
pub use error::*;
pub use geometry::{Map, Pose, PoseChange};
pub use sensor::*;
pub use sensor_handle::{
    AcquireError, InitError, LocalSensorHandle, ReadingRegistrar, SensorHandle,
};
pub use stop::StopSignal;

/// Re-exported so downstream crates agree on one clock type.
pub use tokio::time::Instant;
