//! Configuration validation
//!
//! Rules:
//! - at least one sensor, sensor types unique
//! - the driving sensor is configured
//! - clear intervals and acquisition timeouts > 0
//! - calibrations valid
//! - rig parameters usable (frequency > 0, replay path set, speed > 0)
//! - min_cycle_period_ms does not exceed one hour

use std::collections::HashSet;

use contracts::{ContractError, OdometryBlueprint, RigConfig, SensorConfig};

const MAX_CYCLE_PERIOD_MS: u64 = 3_600_000;

/// Validate an `OdometryBlueprint`, returning the first error found
pub fn validate(blueprint: &OdometryBlueprint) -> Result<(), ContractError> {
    validate_sensor_types(blueprint)?;
    validate_driving_sensor(blueprint)?;
    validate_pipeline(blueprint)?;
    for sensor in &blueprint.sensors {
        validate_sensor(sensor)?;
    }
    Ok(())
}

fn validate_sensor_types(blueprint: &OdometryBlueprint) -> Result<(), ContractError> {
    if blueprint.sensors.is_empty() {
        return Err(ContractError::config_validation(
            "sensors",
            "at least one sensor must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for sensor in &blueprint.sensors {
        if !seen.insert(sensor.sensor_type) {
            return Err(ContractError::config_validation(
                format!("sensors[sensor_type={}]", sensor.sensor_type),
                "duplicate sensor_type",
            ));
        }
    }
    Ok(())
}

fn validate_driving_sensor(blueprint: &OdometryBlueprint) -> Result<(), ContractError> {
    if blueprint.driving_sensor().is_none() {
        return Err(ContractError::config_validation(
            "pipeline.driving_sensor",
            format!(
                "driving sensor '{}' not found in sensors",
                blueprint.pipeline.driving_sensor
            ),
        ));
    }
    Ok(())
}

fn validate_pipeline(blueprint: &OdometryBlueprint) -> Result<(), ContractError> {
    let period = blueprint.pipeline.min_cycle_period_ms;
    if period > MAX_CYCLE_PERIOD_MS {
        return Err(ContractError::config_validation(
            "pipeline.min_cycle_period_ms",
            format!("must be <= {MAX_CYCLE_PERIOD_MS}, got {period}"),
        ));
    }
    Ok(())
}

fn validate_sensor(sensor: &SensorConfig) -> Result<(), ContractError> {
    let prefix = format!("sensors[{}]", sensor.sensor_type);

    if sensor.clear_interval_ms == 0 {
        return Err(ContractError::config_validation(
            format!("{prefix}.clear_interval_ms"),
            "clear_interval_ms must be > 0",
        ));
    }
    if sensor.acquire_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            format!("{prefix}.acquire_timeout_ms"),
            "acquire_timeout_ms must be > 0",
        ));
    }
    if let Some(calibration) = &sensor.calibration {
        calibration.validate().map_err(|message| {
            ContractError::config_validation(format!("{prefix}.calibration"), message)
        })?;
    }

    match &sensor.rig {
        RigConfig::Synthetic(synthetic) => {
            if !(synthetic.frequency_hz.is_finite() && synthetic.frequency_hz > 0.0) {
                return Err(ContractError::config_validation(
                    format!("{prefix}.rig.frequency_hz"),
                    format!("frequency_hz must be > 0, got {}", synthetic.frequency_hz),
                ));
            }
            if !synthetic.speed_mps.is_finite() || !synthetic.yaw_rate_dps.is_finite() {
                return Err(ContractError::config_validation(
                    format!("{prefix}.rig"),
                    "speed_mps and yaw_rate_dps must be finite",
                ));
            }
        }
        RigConfig::Replay(replay) => {
            if replay.path.as_os_str().is_empty() {
                return Err(ContractError::config_validation(
                    format!("{prefix}.rig.path"),
                    "replay path cannot be empty",
                ));
            }
            if !(replay.speed_multiplier.is_finite() && replay.speed_multiplier > 0.0) {
                return Err(ContractError::config_validation(
                    format!("{prefix}.rig.speed_multiplier"),
                    format!(
                        "speed_multiplier must be > 0, got {}",
                        replay.speed_multiplier
                    ),
                ));
            }
        }
    }
    Ok(())
}
