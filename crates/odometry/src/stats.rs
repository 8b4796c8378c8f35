//! Run statistics

use std::time::Duration;

use contracts::Pose;
use ingestion::ReadCounters;
use observability::CycleMetricsAggregator;

use crate::state::StopReason;

/// Pipeline run statistics
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Cycles completed (committed + no-op + skipped)
    pub cycles: u64,
    pub committed: u64,
    pub no_op: u64,
    pub skipped: u64,

    /// Readings evicted by the scheduler
    pub evictions: u64,

    /// Path length of the pose trajectory (m)
    pub distance_m: f64,

    pub final_pose: Pose,
    pub map_points: usize,

    /// `None` while running
    pub stop_reason: Option<StopReason>,

    /// Time since `start`
    pub duration: Duration,

    pub reads: ReadCounters,
    pub cycle_metrics: CycleMetricsAggregator,
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self {
            cycles: 0,
            committed: 0,
            no_op: 0,
            skipped: 0,
            evictions: 0,
            distance_m: 0.0,
            final_pose: Pose::identity(),
            map_points: 0,
            stop_reason: None,
            duration: Duration::ZERO,
            reads: ReadCounters::default(),
            cycle_metrics: CycleMetricsAggregator::default(),
        }
    }
}

impl PipelineStats {
    pub fn cycles_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.cycles as f64 / secs
        } else {
            0.0
        }
    }
}
