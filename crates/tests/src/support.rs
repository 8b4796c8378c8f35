//! Shared fixtures.

use std::time::Duration;

use contracts::{
    ImageSize, Instant, OdometryBlueprint, PoseChange, SensorPayload, SensorReading, SensorType,
    StereoMeasurement,
};
use ingestion::{MockSensorControl, MockSensorHandle, SensorRegistry};
use nalgebra::{Point3, Vector3};
use odometry::{PipelineConfig, ProcessingPipeline};
use sensors::{RigKind, StereoCameraHandle};

pub const STEREO: SensorType = SensorType::StereoCamera;
pub const TIMEOUT: Duration = Duration::from_millis(100);

/// Stereo payload moving `dx` metres forward with the given points
pub fn stereo(dx: f64, points: &[[f64; 3]]) -> SensorPayload {
    SensorPayload::Stereo(StereoMeasurement::new(
        points.iter().map(|[x, y, z]| Point3::new(*x, *y, *z)).collect(),
        PoseChange::from_translation(Vector3::new(dx, 0.0, 0.0)),
        ImageSize::default(),
    ))
}

pub fn reading(frame_id: u64, timestamp: Instant, payload: SensorPayload) -> SensorReading {
    SensorReading::new(STEREO, frame_id, timestamp, payload)
}

/// Registry holding one mock stereo handle driven by `control`
pub fn mock_registry(control: &MockSensorControl) -> SensorRegistry<MockSensorHandle> {
    let mut registry = SensorRegistry::new();
    registry
        .register(MockSensorHandle::new(STEREO, control.clone()), TIMEOUT)
        .unwrap();
    registry
}

pub fn mock_pipeline(
    control: &MockSensorControl,
    config: PipelineConfig,
) -> ProcessingPipeline<MockSensorHandle> {
    ProcessingPipeline::new(mock_registry(control), config)
}

/// Pipeline over real rigs, assembled the way the binary does it
pub fn rig_pipeline(blueprint: &OdometryBlueprint) -> ProcessingPipeline<StereoCameraHandle<RigKind>> {
    let mut registry = SensorRegistry::new();
    for sensor in &blueprint.sensors {
        let handle = sensors::stereo_handle_from_config(sensor).unwrap();
        registry.register(handle, sensor.acquire_timeout()).unwrap();
    }
    ProcessingPipeline::new(registry, PipelineConfig::from_blueprint(blueprint))
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
