//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{
    CompositionConvention, MapPolicy, OdometryBlueprint, RigConfig, SensorType,
    StereoCalibration,
};
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    pipeline: PipelineInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_file: Option<String>,
    sensor_types: Vec<SensorType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sensors: Vec<SensorInfo>,
}

#[derive(Serialize)]
struct PipelineInfo {
    driving_sensor: SensorType,
    composition: CompositionConvention,
    map_policy: MapPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_cycles: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_cycle_period_ms: Option<u64>,
}

#[derive(Serialize)]
struct SensorInfo {
    sensor_type: SensorType,
    clear_interval_ms: u64,
    acquire_timeout_ms: u64,
    rig: String,
    calibration: StereoCalibration,
    calibration_is_default: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "loading configuration info");

    let blueprint = load_config(&args.config)?;
    let info = build_config_info(&blueprint, args.sensors);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("failed to serialize config info")?;
        println!("{json}");
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &OdometryBlueprint, with_sensors: bool) -> ConfigInfo {
    let pipeline = &blueprint.pipeline;

    let sensors = if with_sensors {
        blueprint
            .sensors
            .iter()
            .map(|s| SensorInfo {
                sensor_type: s.sensor_type,
                clear_interval_ms: s.clear_interval_ms,
                acquire_timeout_ms: s.acquire_timeout_ms,
                rig: describe_rig(&s.rig),
                calibration: s.calibration.unwrap_or_default(),
                calibration_is_default: s.calibration.is_none(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        pipeline: PipelineInfo {
            driving_sensor: pipeline.driving_sensor,
            composition: pipeline.composition,
            map_policy: pipeline.map_policy,
            max_cycles: pipeline.max_cycles(),
            min_cycle_period_ms: pipeline
                .min_cycle_period()
                .map(|p| p.as_millis() as u64),
        },
        stop_file: blueprint
            .stop
            .sentinel_file
            .as_ref()
            .map(|p| p.display().to_string()),
        sensor_types: blueprint.sensors.iter().map(|s| s.sensor_type).collect(),
        sensors,
    }
}

fn describe_rig(rig: &RigConfig) -> String {
    match rig {
        RigConfig::Synthetic(s) => format!(
            "synthetic ({} Hz, {} m/s, {} deg/s, {} points/frame)",
            s.frequency_hz, s.speed_mps, s.yaw_rate_dps, s.points_per_frame
        ),
        RigConfig::Replay(r) => format!(
            "replay ({}, x{}{})",
            r.path.display(),
            r.speed_multiplier,
            if r.loop_playback { ", looping" } else { "" }
        ),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Odometry Configuration ===\n");
    println!("Version: {}", info.version);

    println!("\nPipeline:");
    println!("  Driving sensor: {}", info.pipeline.driving_sensor);
    println!("  Composition: {:?}", info.pipeline.composition);
    println!("  Map policy: {:?}", info.pipeline.map_policy);
    match info.pipeline.max_cycles {
        Some(max) => println!("  Max cycles: {max}"),
        None => println!("  Max cycles: unlimited"),
    }
    if let Some(period) = info.pipeline.min_cycle_period_ms {
        println!("  Min cycle period: {period}ms");
    }
    if let Some(ref path) = info.stop_file {
        println!("  Stop file: {path}");
    }

    println!("\nSensor types ({}):", info.sensor_types.len());
    for sensor_type in &info.sensor_types {
        println!("  - {sensor_type}");
    }

    if !info.sensors.is_empty() {
        println!("\nSensors:");
        for sensor in &info.sensors {
            let c = &sensor.calibration;
            println!("  {}", sensor.sensor_type);
            println!("    Rig: {}", sensor.rig);
            println!("    Clear interval: {}ms", sensor.clear_interval_ms);
            println!("    Acquire timeout: {}ms", sensor.acquire_timeout_ms);
            println!(
                "    Calibration{}: f={}px baseline={}m principal=({}, {}) {}x{}",
                if sensor.calibration_is_default { " (default)" } else { "" },
                c.focal_length_px,
                c.baseline_m,
                c.cx,
                c.cy,
                c.width,
                c.height
            );
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    const CONFIG: &str = r#"
[pipeline]
max_cycles = 20
min_cycle_period_ms = 100

[[sensors]]
sensor_type = "stereo_camera"

[sensors.rig]
kind = "replay"
path = "drive.jsonl"
loop_playback = true
"#;

    #[test]
    fn test_info_without_sensor_details() {
        let bp = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let info = build_config_info(&bp, false);

        assert_eq!(info.pipeline.max_cycles, Some(20));
        assert_eq!(info.pipeline.min_cycle_period_ms, Some(100));
        assert_eq!(info.sensor_types, vec![SensorType::StereoCamera]);
        assert!(info.sensors.is_empty());
    }

    #[test]
    fn test_info_with_sensor_details() {
        let bp = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let info = build_config_info(&bp, true);

        let sensor = &info.sensors[0];
        assert!(sensor.calibration_is_default);
        assert!(sensor.rig.starts_with("replay (drive.jsonl"));
        assert!(sensor.rig.contains("looping"));

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["pipeline"]["driving_sensor"], "stereo_camera");
        assert_eq!(json["pipeline"]["composition"], "body_frame");
    }
}
