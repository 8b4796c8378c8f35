//! # Sensors
//!
//! Concrete sensor handles.
//!
//! Responsibilities:
//! - `StereoCameraHandle`: the stereo camera `SensorHandle`, calibrating its
//!   rig before initialization succeeds
//! - `StereoRig` abstraction over the frame source (grab + point cloud +
//!   odometry for one frame pair)
//! - Synthetic and Replay rigs, so the pipeline runs without hardware
//!
//! ## Usage Example
//!
//! ```ignore
//! let handle = sensors::stereo_handle_from_config(&sensor_config)?;
//! registry.register(handle, sensor_config.acquire_timeout());
//! ```

mod error;
mod factory;
mod replay;
mod rig;
mod stereo;
mod synthetic;

pub use error::{Result, SensorsError};
pub use factory::{rig_from_config, stereo_handle_from_config};
pub use replay::{load_recording, ReplayRecord, ReplayRig};
pub use rig::{LocalStereoRig, RigKind, StereoRig};
pub use stereo::StereoCameraHandle;
pub use synthetic::SyntheticRig;
