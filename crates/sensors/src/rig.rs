//! StereoRig trait - frame pair source behind a stereo handle

use contracts::{AcquireError, InitError, StereoCalibration, StereoMeasurement};

use crate::replay::ReplayRig;
use crate::synthetic::SyntheticRig;

/// Stereo frame pair source.
///
/// Covers raw device I/O and the stereo math (rectification, disparity,
/// reprojection, visual odometry): one `grab` yields the point cloud and
/// the motion estimate for the current frame pair.
#[trait_variant::make(StereoRig: Send)]
pub trait LocalStereoRig {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Open the device
    fn open(&mut self) -> Result<(), InitError>;

    /// Obtain the rectified calibration of the pair
    fn calibrate(&mut self) -> Result<StereoCalibration, InitError>;

    /// Grab one frame pair and derive its measurement
    async fn grab(
        &mut self,
        calibration: StereoCalibration,
    ) -> Result<StereoMeasurement, AcquireError>;

    /// Whether the device still delivers frames
    fn is_connected(&self) -> bool;

    /// Release the device
    fn release(&mut self);
}

/// Rig backends selectable from configuration
#[derive(Debug)]
pub enum RigKind {
    Synthetic(SyntheticRig),
    Replay(ReplayRig),
}

impl StereoRig for RigKind {
    fn name(&self) -> &'static str {
        match self {
            RigKind::Synthetic(rig) => StereoRig::name(rig),
            RigKind::Replay(rig) => StereoRig::name(rig),
        }
    }

    fn open(&mut self) -> Result<(), InitError> {
        match self {
            RigKind::Synthetic(rig) => StereoRig::open(rig),
            RigKind::Replay(rig) => StereoRig::open(rig),
        }
    }

    fn calibrate(&mut self) -> Result<StereoCalibration, InitError> {
        match self {
            RigKind::Synthetic(rig) => StereoRig::calibrate(rig),
            RigKind::Replay(rig) => StereoRig::calibrate(rig),
        }
    }

    async fn grab(
        &mut self,
        calibration: StereoCalibration,
    ) -> Result<StereoMeasurement, AcquireError> {
        match self {
            RigKind::Synthetic(rig) => StereoRig::grab(rig, calibration).await,
            RigKind::Replay(rig) => StereoRig::grab(rig, calibration).await,
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            RigKind::Synthetic(rig) => StereoRig::is_connected(rig),
            RigKind::Replay(rig) => StereoRig::is_connected(rig),
        }
    }

    fn release(&mut self) {
        match self {
            RigKind::Synthetic(rig) => StereoRig::release(rig),
            RigKind::Replay(rig) => StereoRig::release(rig),
        }
    }
}
