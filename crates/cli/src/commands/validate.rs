//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{MapPolicy, OdometryBlueprint, RigConfig, SensorType};
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    driving_sensor: SensorType,
    sensor_count: usize,
    max_cycles: u64,
    has_stop_file: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match load_config(&args.config) {
        Ok(blueprint) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&blueprint),
            summary: Some(ConfigSummary {
                version: format!("{:?}", blueprint.version),
                driving_sensor: blueprint.pipeline.driving_sensor,
                sensor_count: blueprint.sensors.len(),
                max_cycles: blueprint.pipeline.max_cycles,
                has_stop_file: blueprint.stop.sentinel_file.is_some(),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Non-fatal configuration issues
fn collect_warnings(blueprint: &OdometryBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let unlimited = blueprint.pipeline.max_cycles().is_none();

    if unlimited && blueprint.stop.sentinel_file.is_none() {
        warnings.push(
            "no max_cycles and no stop.sentinel_file - run ends only on Ctrl+C or disconnect"
                .to_string(),
        );
    }

    if unlimited && blueprint.pipeline.map_policy == MapPolicy::Append {
        warnings.push("map_policy = append with unlimited cycles - map grows without bound".to_string());
    }

    for sensor in &blueprint.sensors {
        if sensor.sensor_type != SensorType::StereoCamera {
            warnings.push(format!(
                "sensor '{}' has no handle implementation and will be skipped",
                sensor.sensor_type
            ));
        }

        if let RigConfig::Synthetic(synthetic) = &sensor.rig {
            let frame_period_ms = 1000.0 / synthetic.frequency_hz;
            if (sensor.clear_interval_ms as f64) < frame_period_ms {
                warnings.push(format!(
                    "sensor '{}' clear_interval_ms ({}) is shorter than its frame period \
                     ({frame_period_ms:.0}ms) - readings may be evicted before a pair forms",
                    sensor.sensor_type, sensor.clear_interval_ms
                ));
            }
            if (sensor.acquire_timeout_ms as f64) < frame_period_ms {
                warnings.push(format!(
                    "sensor '{}' acquire_timeout_ms ({}) is shorter than its frame period \
                     ({frame_period_ms:.0}ms) - most cycles will time out",
                    sensor.sensor_type, sensor.acquire_timeout_ms
                ));
            }
        }

        if sensor.sensor_type == SensorType::StereoCamera && sensor.calibration.is_none() {
            warnings.push(format!(
                "sensor '{}' has no calibration - default rectified pair is used",
                sensor.sensor_type
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Driving sensor: {}", summary.driving_sensor);
            println!("  Sensors: {}", summary.sensor_count);
            println!("  Max cycles: {}", summary.max_cycles);
            println!("  Stop file: {}", if summary.has_stop_file { "yes" } else { "no" });
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
