//! StereoCameraHandle - stereo camera `SensorHandle`

use contracts::{
    AcquireError, InitError, ReadingRegistrar, SensorHandle, SensorPayload, SensorType,
    StereoCalibration,
};
use tracing::{debug, info, instrument, warn};

use crate::rig::StereoRig;

/// Stereo camera handle over a pluggable rig.
///
/// Initialization opens the rig, obtains and validates its calibration, and
/// only then registers the stereo reading history. `acquire` refuses to run
/// until a calibration is held.
#[derive(Debug)]
pub struct StereoCameraHandle<R> {
    rig: R,
    calibration: Option<StereoCalibration>,
    shut_down: bool,
}

impl<R: StereoRig> StereoCameraHandle<R> {
    pub fn new(rig: R) -> Self {
        Self {
            rig,
            calibration: None,
            shut_down: false,
        }
    }

    /// Calibration obtained during `initialize`
    pub fn calibration(&self) -> Option<&StereoCalibration> {
        self.calibration.as_ref()
    }

    pub fn rig(&self) -> &R {
        &self.rig
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl<R: StereoRig> SensorHandle for StereoCameraHandle<R> {
    fn sensor_type(&self) -> SensorType {
        SensorType::StereoCamera
    }

    #[instrument(name = "stereo_initialize", skip(self, registrar), fields(rig = self.rig.name()))]
    fn initialize(&mut self, registrar: &mut dyn ReadingRegistrar) -> Result<(), InitError> {
        self.rig.open()?;

        let calibration = self.rig.calibrate()?;
        calibration.validate().map_err(InitError::calibration)?;

        if !self.rig.is_connected() {
            return Err(InitError::NotConnected);
        }

        registrar.register_sensor_type(SensorType::StereoCamera);
        self.calibration = Some(calibration);
        self.shut_down = false;

        info!(
            focal_length_px = calibration.focal_length_px,
            baseline_m = calibration.baseline_m,
            width = calibration.width,
            height = calibration.height,
            "stereo camera initialized"
        );
        Ok(())
    }

    async fn acquire(&mut self) -> Result<SensorPayload, AcquireError> {
        let calibration = self.calibration.ok_or(AcquireError::NotInitialized)?;
        if self.shut_down {
            return Err(AcquireError::NotInitialized);
        }

        let measurement = self.rig.grab(calibration).await?;
        debug!(
            points = measurement.point_cloud.len(),
            "stereo frame pair processed"
        );
        Ok(SensorPayload::Stereo(measurement))
    }

    fn check_connection(&self) -> bool {
        self.calibration.is_some() && !self.shut_down && self.rig.is_connected()
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.rig.release();
        self.shut_down = true;
        if self.calibration.is_none() {
            warn!(rig = self.rig.name(), "stereo camera shut down before initialization");
        } else {
            info!(rig = self.rig.name(), "stereo camera shut down");
        }
    }
}
