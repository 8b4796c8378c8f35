//! Registry and pipeline construction from a blueprint.

use anyhow::{Context, Result};
use contracts::OdometryBlueprint;
use ingestion::SensorRegistry;
use odometry::{AnyStop, PipelineConfig, ProcessingPipeline, SentinelFile, StopFlag};
use sensors::{RigKind, SensorsError, StereoCameraHandle};
use tracing::{info, warn};

/// Pipeline over the configured stereo rigs
pub type StereoPipeline = ProcessingPipeline<StereoCameraHandle<RigKind>>;

/// Register one handle per configured sensor.
///
/// Sensor types without a handle implementation are skipped with a warning;
/// if the skipped type is the driving sensor, `start` reports it.
pub fn build_registry(
    blueprint: &OdometryBlueprint,
) -> Result<SensorRegistry<StereoCameraHandle<RigKind>>> {
    let mut registry = SensorRegistry::new();

    for sensor in &blueprint.sensors {
        match sensors::stereo_handle_from_config(sensor) {
            Ok(handle) => {
                registry
                    .register(handle, sensor.acquire_timeout())
                    .with_context(|| format!("failed to register {}", sensor.sensor_type))?;
                info!(
                    sensor_type = %sensor.sensor_type,
                    timeout_ms = sensor.acquire_timeout_ms,
                    "sensor registered"
                );
            }
            Err(SensorsError::UnsupportedSensorType { sensor_type }) => {
                warn!(sensor_type = %sensor_type, "no handle for sensor type, skipped");
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to build handle for {}", sensor.sensor_type))
            }
        }
    }

    Ok(registry)
}

/// Stop when `flag` is set or the configured sentinel file appears
pub fn stop_signal(blueprint: &OdometryBlueprint, flag: StopFlag) -> AnyStop {
    let mut stop = AnyStop::new().with(flag);
    if let Some(path) = &blueprint.stop.sentinel_file {
        info!(path = %path.display(), "watching stop sentinel file");
        stop.push(SentinelFile::new(path));
    }
    stop
}

pub fn build_pipeline(blueprint: &OdometryBlueprint, flag: StopFlag) -> Result<StereoPipeline> {
    let registry = build_registry(blueprint)?;
    let config = PipelineConfig::from_blueprint(blueprint);
    Ok(ProcessingPipeline::new(registry, config).with_stop_signal(stop_signal(blueprint, flag)))
}
