//! Rectified stereo calibration

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::ImageSize;

/// Rectified pinhole stereo pair parameters.
///
/// A stereo rig must produce a valid calibration before its handle may
/// finish initialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereoCalibration {
    /// Focal length (pixels), shared by both rectified cameras
    pub focal_length_px: f64,

    /// Distance between optical centers (meters)
    pub baseline_m: f64,

    /// Principal point x (pixels)
    pub cx: f64,

    /// Principal point y (pixels)
    pub cy: f64,

    /// Rectified image width (pixels)
    pub width: u32,

    /// Rectified image height (pixels)
    pub height: u32,
}

impl Default for StereoCalibration {
    fn default() -> Self {
        Self {
            focal_length_px: 700.0,
            baseline_m: 0.12,
            cx: 320.0,
            cy: 240.0,
            width: 640,
            height: 480,
        }
    }
}

impl StereoCalibration {
    /// Check the parameters describe a usable rectified pair.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.focal_length_px.is_finite() && self.focal_length_px > 0.0) {
            return Err(format!(
                "focal_length_px must be > 0, got {}",
                self.focal_length_px
            ));
        }
        if !(self.baseline_m.is_finite() && self.baseline_m > 0.0) {
            return Err(format!("baseline_m must be > 0, got {}", self.baseline_m));
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }

    pub fn image_size(&self) -> ImageSize {
        ImageSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Depth (meters) for a disparity (pixels); `None` for non-positive disparity.
    pub fn depth_from_disparity(&self, disparity_px: f64) -> Option<f64> {
        (disparity_px > 0.0).then(|| self.focal_length_px * self.baseline_m / disparity_px)
    }

    /// Reproject a left-image pixel with known disparity into the camera frame.
    ///
    /// Camera frame: x right, y down, z forward.
    pub fn reproject(&self, u: f64, v: f64, disparity_px: f64) -> Option<Point3<f64>> {
        let z = self.depth_from_disparity(disparity_px)?;
        let x = (u - self.cx) * z / self.focal_length_px;
        let y = (v - self.cy) * z / self.focal_length_px;
        Some(Point3::new(x, y, z))
    }

    /// Disparity (pixels) a point at `depth_m` produces.
    pub fn disparity_for_depth(&self, depth_m: f64) -> Option<f64> {
        (depth_m > 0.0).then(|| self.focal_length_px * self.baseline_m / depth_m)
    }
}
