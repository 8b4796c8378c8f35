//! Pipeline configuration

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::{CompositionConvention, ContractError, MapPolicy, OdometryBlueprint, SensorType};

/// Clear interval used for registered sensors without an explicit one
pub const DEFAULT_CLEAR_INTERVAL: Duration = Duration::from_secs(5);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sensor type whose readings drive pose and map updates
    pub driving_sensor: SensorType,

    /// Pose change composition convention, fixed for the run
    pub composition: CompositionConvention,

    /// Map fusion policy, fixed for the run
    pub map_policy: MapPolicy,

    /// Stop after this many cycles (None = unlimited)
    pub max_cycles: Option<u64>,

    /// Minimum wall time per cycle (None = back-to-back)
    pub min_cycle_period: Option<Duration>,

    /// Eviction cadence per sensor type
    pub clear_intervals: BTreeMap<SensorType, Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            driving_sensor: SensorType::StereoCamera,
            composition: CompositionConvention::default(),
            map_policy: MapPolicy::default(),
            max_cycles: None,
            min_cycle_period: None,
            clear_intervals: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Pipeline settings and per-sensor clear intervals of a blueprint
    pub fn from_blueprint(blueprint: &OdometryBlueprint) -> Self {
        let pipeline = &blueprint.pipeline;
        Self {
            driving_sensor: pipeline.driving_sensor,
            composition: pipeline.composition,
            map_policy: pipeline.map_policy,
            max_cycles: pipeline.max_cycles(),
            min_cycle_period: pipeline.min_cycle_period(),
            clear_intervals: blueprint
                .sensors
                .iter()
                .map(|s| (s.sensor_type, s.clear_interval()))
                .collect(),
        }
    }

    pub fn with_clear_interval(mut self, sensor_type: SensorType, interval: Duration) -> Self {
        self.clear_intervals.insert(sensor_type, interval);
        self
    }

    pub fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = (max_cycles > 0).then_some(max_cycles);
        self
    }

    /// Clear interval of `sensor_type`, falling back to [`DEFAULT_CLEAR_INTERVAL`]
    pub fn clear_interval(&self, sensor_type: SensorType) -> Duration {
        self.clear_intervals
            .get(&sensor_type)
            .copied()
            .unwrap_or(DEFAULT_CLEAR_INTERVAL)
    }

    /// Reject zero clear intervals
    pub fn validate(&self) -> Result<(), ContractError> {
        for (sensor_type, interval) in &self.clear_intervals {
            if interval.is_zero() {
                return Err(ContractError::InvalidInterval {
                    sensor_type: *sensor_type,
                    interval_ms: interval.as_millis(),
                });
            }
        }
        Ok(())
    }
}
