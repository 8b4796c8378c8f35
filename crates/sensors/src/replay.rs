//! Replay rig - plays back recorded stereo measurements
//!
//! Reads a JSON-lines recording (one measurement per line) and replays it
//! at the original timestamps, scaled by a speed multiplier. Once the
//! recording is exhausted the rig reports disconnected unless looping.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use contracts::{
    AcquireError, InitError, Instant, PoseChange, ReplayRigConfig, StereoCalibration,
    StereoMeasurement,
};
use nalgebra::{Matrix3, Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, SensorsError};
use crate::rig::StereoRig;

/// One recorded frame pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// Capture time in seconds, relative to an arbitrary origin
    pub timestamp: f64,

    /// Motion since the previous frame pair, vehicle frame
    #[serde(default)]
    pub delta_translation: [f64; 3],

    /// Yaw change in degrees (ignored when `delta_rotation` is set)
    #[serde(default)]
    pub delta_yaw_deg: f64,

    /// Full rotation change, row-major
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_rotation: Option<[[f64; 3]; 3]>,

    /// Reprojected points, vehicle frame
    #[serde(default)]
    pub points: Vec<[f64; 3]>,

    /// Recorded processing failure for this frame pair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplayRecord {
    fn odometry(&self) -> PoseChange {
        let [x, y, z] = self.delta_translation;
        let rotation = match self.delta_rotation {
            Some(rows) => Matrix3::from_fn(|r, c| rows[r][c]),
            None => Rotation3::from_axis_angle(&Vector3::z_axis(), self.delta_yaw_deg.to_radians())
                .into_inner(),
        };
        PoseChange::new(Vector3::new(x, y, z), rotation)
    }

    fn measurement(&self, calibration: &StereoCalibration) -> StereoMeasurement {
        let points = self
            .points
            .iter()
            .map(|[x, y, z]| Point3::new(*x, *y, *z))
            .collect();
        StereoMeasurement::new(points, self.odometry(), calibration.image_size())
    }
}

/// Load a JSON-lines recording, sorted by timestamp.
///
/// Blank lines are skipped.
pub fn load_recording(path: &Path) -> Result<Vec<ReplayRecord>> {
    let file = File::open(path).map_err(|e| SensorsError::recording_io(path, e))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SensorsError::recording_io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: ReplayRecord =
            serde_json::from_str(&line).map_err(|source| SensorsError::RecordingParse {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(SensorsError::EmptyRecording {
            path: path.to_path_buf(),
        });
    }

    records.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    Ok(records)
}

/// Replay rig
#[derive(Debug)]
pub struct ReplayRig {
    config: ReplayRigConfig,
    calibration: StereoCalibration,
    records: Vec<ReplayRecord>,
    cursor: usize,
    started_at: Option<Instant>,
    opened: bool,
}

impl ReplayRig {
    pub fn new(config: ReplayRigConfig, calibration: StereoCalibration) -> Self {
        Self {
            config,
            calibration,
            records: Vec::new(),
            cursor: 0,
            started_at: None,
            opened: false,
        }
    }

    /// Records loaded by `open`
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn exhausted(&self) -> bool {
        self.cursor >= self.records.len()
    }

    fn playback_offset(&self, record: &ReplayRecord) -> Duration {
        let first = self.records.first().map_or(0.0, |r| r.timestamp);
        let speed = self.config.speed_multiplier.max(0.1);
        Duration::from_secs_f64(((record.timestamp - first) / speed).max(0.0))
    }
}

impl StereoRig for ReplayRig {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn open(&mut self) -> std::result::Result<(), InitError> {
        self.records = load_recording(&self.config.path)?;
        self.cursor = 0;
        self.started_at = None;
        self.opened = true;

        info!(
            path = %self.config.path.display(),
            records = self.records.len(),
            speed_multiplier = self.config.speed_multiplier,
            loop_playback = self.config.loop_playback,
            "loaded replay recording"
        );
        Ok(())
    }

    fn calibrate(&mut self) -> std::result::Result<StereoCalibration, InitError> {
        Ok(self.calibration)
    }

    async fn grab(
        &mut self,
        calibration: StereoCalibration,
    ) -> std::result::Result<StereoMeasurement, AcquireError> {
        if !self.opened {
            return Err(AcquireError::grab("replay rig is not open"));
        }

        if self.exhausted() {
            if !self.config.loop_playback {
                return Err(AcquireError::grab("recording exhausted"));
            }
            debug!("looping replay");
            self.cursor = 0;
            self.started_at = None;
        }

        let started_at = *self.started_at.get_or_insert_with(Instant::now);
        let record = &self.records[self.cursor];
        tokio::time::sleep_until(started_at + self.playback_offset(record)).await;

        let record = &self.records[self.cursor];
        self.cursor += 1;

        if let Some(message) = &record.error {
            warn!(timestamp = record.timestamp, error = %message, "recorded processing failure");
            return Err(AcquireError::processing(message.clone()));
        }

        Ok(record.measurement(&calibration))
    }

    fn is_connected(&self) -> bool {
        self.opened && (self.config.loop_playback || !self.exhausted())
    }

    fn release(&mut self) {
        if self.opened {
            debug!(played = self.cursor, "replay rig released");
        }
        self.opened = false;
    }
}
