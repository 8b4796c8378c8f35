//! Handle construction from configuration

use contracts::{RigConfig, SensorConfig, SensorType};
use tracing::debug;

use crate::error::{Result, SensorsError};
use crate::replay::ReplayRig;
use crate::rig::{RigKind, StereoRig};
use crate::stereo::StereoCameraHandle;
use crate::synthetic::SyntheticRig;

/// Build the rig backend a sensor configuration selects.
///
/// Missing calibration falls back to the default rectified pair.
pub fn rig_from_config(config: &SensorConfig) -> RigKind {
    let calibration = config.calibration.unwrap_or_default();
    match &config.rig {
        RigConfig::Synthetic(synthetic) => {
            RigKind::Synthetic(SyntheticRig::new(synthetic.clone(), calibration))
        }
        RigConfig::Replay(replay) => RigKind::Replay(ReplayRig::new(replay.clone(), calibration)),
    }
}

/// Build the stereo camera handle for `config`.
///
/// # Errors
/// [`SensorsError::UnsupportedSensorType`] for any type other than the
/// stereo camera
pub fn stereo_handle_from_config(config: &SensorConfig) -> Result<StereoCameraHandle<RigKind>> {
    if config.sensor_type != SensorType::StereoCamera {
        return Err(SensorsError::UnsupportedSensorType {
            sensor_type: config.sensor_type,
        });
    }

    let rig = rig_from_config(config);
    debug!(sensor_type = %config.sensor_type, rig = rig.name(), "stereo handle built");
    Ok(StereoCameraHandle::new(rig))
}
