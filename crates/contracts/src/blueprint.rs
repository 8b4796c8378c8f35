//! OdometryBlueprint - Config Loader output
//!
//! Describes the whole run: pipeline conventions, stop signal, and the
//! sensors with their eviction cadence, acquisition timeout and rig backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::{SensorType, StereoCalibration};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdometryBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Processing pipeline settings
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// External stop signal settings
    #[serde(default)]
    pub stop: StopSettings,

    /// Sensor definitions
    pub sensors: Vec<SensorConfig>,
}

/// Processing pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Sensor type whose readings drive pose and map updates
    #[serde(default = "default_driving_sensor")]
    pub driving_sensor: SensorType,

    /// How a pose change is folded into the running pose
    #[serde(default)]
    pub composition: CompositionConvention,

    /// How a new point cloud is folded into the map
    #[serde(default)]
    pub map_policy: MapPolicy,

    /// Stop after this many cycles (0 = unlimited)
    #[serde(default)]
    pub max_cycles: u64,

    /// Minimum wall time per cycle in milliseconds (0 = run back-to-back)
    #[serde(default)]
    pub min_cycle_period_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            driving_sensor: default_driving_sensor(),
            composition: CompositionConvention::default(),
            map_policy: MapPolicy::default(),
            max_cycles: 0,
            min_cycle_period_ms: 0,
        }
    }
}

impl PipelineSettings {
    pub fn max_cycles(&self) -> Option<u64> {
        (self.max_cycles > 0).then_some(self.max_cycles)
    }

    pub fn min_cycle_period(&self) -> Option<Duration> {
        (self.min_cycle_period_ms > 0).then(|| Duration::from_millis(self.min_cycle_period_ms))
    }
}

fn default_driving_sensor() -> SensorType {
    SensorType::StereoCamera
}

/// Pose change composition convention, fixed for the whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionConvention {
    /// Change is expressed in the vehicle's current frame:
    /// `t += R·Δt`, then `R = R·ΔR`
    #[default]
    BodyFrame,
    /// Change is expressed in the world frame:
    /// `t += Δt`, then `R = ΔR·R`
    WorldFrame,
}

/// Map fusion policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapPolicy {
    /// Append every new cloud (unbounded growth)
    #[default]
    Append,
    /// Keep only the latest cloud
    Replace,
}

/// External stop signal settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopSettings {
    /// Stop once this file exists
    #[serde(default)]
    pub sentinel_file: Option<PathBuf>,
}

/// Sensor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Sensor category
    pub sensor_type: SensorType,

    /// Drop the oldest retained reading this often (milliseconds), must be > 0
    #[serde(default = "default_clear_interval_ms")]
    pub clear_interval_ms: u64,

    /// Upper bound on one acquisition (milliseconds), must be > 0
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// Rectified stereo calibration (stereo sensors only)
    #[serde(default)]
    pub calibration: Option<StereoCalibration>,

    /// Backend producing frames
    #[serde(default)]
    pub rig: RigConfig,
}

impl SensorConfig {
    pub fn clear_interval(&self) -> Duration {
        Duration::from_millis(self.clear_interval_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

fn default_clear_interval_ms() -> u64 {
    5_000
}

fn default_acquire_timeout_ms() -> u64 {
    1_000
}

/// Stereo rig backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RigConfig {
    /// Generated constant-velocity trajectory (no hardware required)
    Synthetic(SyntheticRigConfig),
    /// Recorded measurements replayed from a JSON-lines file
    Replay(ReplayRigConfig),
}

impl Default for RigConfig {
    fn default() -> Self {
        RigConfig::Synthetic(SyntheticRigConfig::default())
    }
}

/// Synthetic rig parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticRigConfig {
    /// Frame pair rate (Hz), must be > 0
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f64,

    /// Forward speed (m/s)
    #[serde(default = "default_speed_mps")]
    pub speed_mps: f64,

    /// Yaw rate (degrees/s)
    #[serde(default)]
    pub yaw_rate_dps: f64,

    /// Points reprojected per frame pair
    #[serde(default = "default_points_per_frame")]
    pub points_per_frame: usize,

    /// Inject a processing failure every N frames (0 = never)
    #[serde(default)]
    pub failure_every: u64,

    /// Report disconnected after this many frames
    #[serde(default)]
    pub disconnect_after: Option<u64>,
}

impl Default for SyntheticRigConfig {
    fn default() -> Self {
        Self {
            frequency_hz: default_frequency_hz(),
            speed_mps: default_speed_mps(),
            yaw_rate_dps: 0.0,
            points_per_frame: default_points_per_frame(),
            failure_every: 0,
            disconnect_after: None,
        }
    }
}

fn default_frequency_hz() -> f64 {
    10.0
}

fn default_speed_mps() -> f64 {
    1.0
}

fn default_points_per_frame() -> usize {
    64
}

/// Replay rig parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRigConfig {
    /// JSON-lines recording, one measurement per line
    pub path: PathBuf,

    /// Playback speed multiplier (1.0 = recorded rate)
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f64,

    /// Restart from the first record when exhausted
    #[serde(default)]
    pub loop_playback: bool,
}

fn default_speed_multiplier() -> f64 {
    1.0
}

impl OdometryBlueprint {
    /// Configuration of one sensor type
    pub fn sensor(&self, sensor_type: SensorType) -> Option<&SensorConfig> {
        self.sensors.iter().find(|s| s.sensor_type == sensor_type)
    }

    /// Configuration of the sensor driving the pipeline
    pub fn driving_sensor(&self) -> Option<&SensorConfig> {
        self.sensor(self.pipeline.driving_sensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_defaults() {
        let blueprint: OdometryBlueprint = toml::from_str(
            r#"
[[sensors]]
sensor_type = "stereo_camera"
"#,
        )
        .unwrap();

        assert_eq!(blueprint.version, ConfigVersion::V1);
        assert_eq!(blueprint.pipeline.driving_sensor, SensorType::StereoCamera);
        assert_eq!(
            blueprint.pipeline.composition,
            CompositionConvention::BodyFrame
        );
        assert_eq!(blueprint.pipeline.map_policy, MapPolicy::Append);
        assert_eq!(blueprint.pipeline.max_cycles(), None);

        let stereo = blueprint.driving_sensor().unwrap();
        assert_eq!(stereo.clear_interval(), Duration::from_secs(5));
        assert_eq!(stereo.acquire_timeout(), Duration::from_secs(1));
        assert!(matches!(stereo.rig, RigConfig::Synthetic(_)));
    }

    #[test]
    fn test_replay_rig_tagged() {
        let blueprint: OdometryBlueprint = toml::from_str(
            r#"
[pipeline]
composition = "world_frame"
map_policy = "replace"
max_cycles = 10

[[sensors]]
sensor_type = "stereo_camera"
clear_interval_ms = 250

[sensors.rig]
kind = "replay"
path = "drive.jsonl"
loop_playback = true
"#,
        )
        .unwrap();

        assert_eq!(blueprint.pipeline.max_cycles(), Some(10));
        assert_eq!(blueprint.pipeline.map_policy, MapPolicy::Replace);
        match &blueprint.sensors[0].rig {
            RigConfig::Replay(replay) => {
                assert_eq!(replay.path, PathBuf::from("drive.jsonl"));
                assert!(replay.loop_playback);
                assert_eq!(replay.speed_multiplier, 1.0);
            }
            other => panic!("expected replay rig, got {other:?}"),
        }
    }
}
