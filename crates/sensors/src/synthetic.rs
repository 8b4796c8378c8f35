//! Synthetic rig
//!
//! Generates a constant-velocity, constant-yaw-rate trajectory and a fixed
//! pattern of reprojected points, paced at the configured frame rate.
//! Used for testing and development without camera hardware.

use std::time::Duration;

use contracts::{
    AcquireError, InitError, Instant, PoseChange, StereoCalibration, StereoMeasurement,
    SyntheticRigConfig,
};
use nalgebra::{Point3, Rotation3, Vector3};
use tracing::{debug, trace};

use crate::rig::StereoRig;

/// Synthetic stereo rig
#[derive(Debug)]
pub struct SyntheticRig {
    config: SyntheticRigConfig,
    calibration: StereoCalibration,
    opened: bool,
    frames: u64,
    next_frame_at: Option<Instant>,
}

impl SyntheticRig {
    pub fn new(config: SyntheticRigConfig, calibration: StereoCalibration) -> Self {
        Self {
            config,
            calibration,
            opened: false,
            frames: 0,
            next_frame_at: None,
        }
    }

    /// Create synthetic rig with default configuration
    pub fn with_defaults() -> Self {
        Self::new(SyntheticRigConfig::default(), StereoCalibration::default())
    }

    /// Frame pairs produced so far (including injected failures)
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.config.frequency_hz)
    }

    /// Motion between two consecutive frame pairs, vehicle frame (x forward)
    fn frame_motion(&self) -> PoseChange {
        let dt = 1.0 / self.config.frequency_hz;
        let yaw = (self.config.yaw_rate_dps * dt).to_radians();
        PoseChange::new(
            Vector3::new(self.config.speed_mps * dt, 0.0, 0.0),
            Rotation3::from_axis_angle(&Vector3::z_axis(), yaw).into_inner(),
        )
    }

    fn generate_points(calibration: &StereoCalibration, count: usize, frame: u64) -> Vec<Point3<f64>> {
        let width = u64::from(calibration.width.max(1));
        let height = u64::from(calibration.height.max(1));

        (0..count as u64)
            .filter_map(|i| {
                let u = ((i * 37 + frame * 11) % width) as f64;
                let v = ((i * 53) % height) as f64;
                let disparity = 4.0 + ((i * 7) % 60) as f64;
                calibration.reproject(u, v, disparity)
            })
            // camera (x right, y down, z forward) to vehicle (x forward, y left, z up)
            .map(|p| Point3::new(p.z, -p.x, -p.y))
            .collect()
    }
}

impl StereoRig for SyntheticRig {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn open(&mut self) -> Result<(), InitError> {
        if !(self.config.frequency_hz.is_finite() && self.config.frequency_hz > 0.0) {
            return Err(InitError::device(format!(
                "frequency_hz must be > 0, got {}",
                self.config.frequency_hz
            )));
        }
        self.opened = true;
        self.frames = 0;
        self.next_frame_at = None;
        debug!(
            frequency_hz = self.config.frequency_hz,
            speed_mps = self.config.speed_mps,
            yaw_rate_dps = self.config.yaw_rate_dps,
            "synthetic rig opened"
        );
        Ok(())
    }

    fn calibrate(&mut self) -> Result<StereoCalibration, InitError> {
        Ok(self.calibration)
    }

    async fn grab(
        &mut self,
        calibration: StereoCalibration,
    ) -> Result<StereoMeasurement, AcquireError> {
        if !self.opened {
            return Err(AcquireError::grab("synthetic rig is not open"));
        }
        if !self.is_connected() {
            return Err(AcquireError::grab("synthetic rig disconnected"));
        }

        let deadline = *self.next_frame_at.get_or_insert_with(Instant::now);
        tokio::time::sleep_until(deadline).await;
        self.next_frame_at = Some(deadline + self.frame_period());

        let frame = self.frames;
        self.frames += 1;

        if self.config.failure_every > 0 && self.frames % self.config.failure_every == 0 {
            return Err(AcquireError::processing(format!(
                "injected disparity failure at frame {frame}"
            )));
        }

        // the first frame pair has no predecessor to move from
        let odometry = if frame == 0 {
            PoseChange::identity()
        } else {
            self.frame_motion()
        };
        let points = Self::generate_points(&calibration, self.config.points_per_frame, frame);

        trace!(frame, points = points.len(), "synthetic frame pair");
        Ok(StereoMeasurement::new(
            points,
            odometry,
            calibration.image_size(),
        ))
    }

    fn is_connected(&self) -> bool {
        self.opened
            && self
                .config
                .disconnect_after
                .map_or(true, |limit| self.frames < limit)
    }

    fn release(&mut self) {
        if self.opened {
            debug!(frames = self.frames, "synthetic rig released");
        }
        self.opened = false;
    }
}
