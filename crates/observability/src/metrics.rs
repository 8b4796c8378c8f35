//! Pipeline cycle metrics
//!
//! Prometheus-facing recorders plus an in-memory aggregator for the
//! end-of-run summary.

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::Pose;
use metrics::{counter, gauge, histogram};

/// How one pipeline cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CycleKind {
    /// Pose and map updated
    Committed,
    /// Fewer than two readings, pose and map untouched
    NoOp,
    /// Read failed or timed out, cycle skipped
    Skipped,
}

impl CycleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleKind::Committed => "committed",
            CycleKind::NoOp => "no_op",
            CycleKind::Skipped => "skipped",
        }
    }
}

/// Record one finished cycle
///
/// # Example
///
/// ```ignore
/// use observability::metrics::{record_cycle, CycleKind};
///
/// record_cycle(CycleKind::Committed, started.elapsed());
/// ```
pub fn record_cycle(kind: CycleKind, duration: Duration) {
    counter!("stereo_odometry_cycles_total", "outcome" => kind.as_str()).increment(1);
    histogram!("stereo_odometry_cycle_duration_ms").record(duration.as_secs_f64() * 1000.0);
}

/// Record the committed pose and map size
pub fn record_pose(pose: &Pose, map_points: usize) {
    let t = pose.translation();
    gauge!("stereo_odometry_pose_x_m").set(t.x);
    gauge!("stereo_odometry_pose_y_m").set(t.y);
    gauge!("stereo_odometry_pose_z_m").set(t.z);
    gauge!("stereo_odometry_map_points").set(map_points as f64);
}

/// Record the reason a cycle was skipped
pub fn record_skip(reason: &'static str) {
    counter!("stereo_odometry_skipped_cycles_total", "reason" => reason).increment(1);
}

/// Record a pipeline state transition
pub fn record_state(state: &'static str) {
    counter!("stereo_odometry_state_transitions_total", "state" => state).increment(1);
}

/// Cycle metrics aggregator
///
/// Aggregates in memory for statistics and summary output.
#[derive(Debug, Clone, Default)]
pub struct CycleMetricsAggregator {
    /// Cycles per outcome
    pub cycles: BTreeMap<CycleKind, u64>,

    /// Readings evicted
    pub evictions: u64,

    /// Cycle wall time (ms)
    pub cycle_duration: RunningStats,

    /// Distance moved per committed cycle (m)
    pub step_distance: RunningStats,

    /// Skipped cycles per reason
    pub skip_reasons: BTreeMap<&'static str, u64>,
}

impl CycleMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed cycle that moved the pose by `step_distance_m`
    pub fn record_committed(&mut self, duration: Duration, step_distance_m: f64) {
        self.record(CycleKind::Committed, duration);
        self.step_distance.push(step_distance_m);
    }

    pub fn record_no_op(&mut self, duration: Duration) {
        self.record(CycleKind::NoOp, duration);
    }

    pub fn record_skipped(&mut self, duration: Duration, reason: &'static str) {
        self.record(CycleKind::Skipped, duration);
        *self.skip_reasons.entry(reason).or_insert(0) += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    fn record(&mut self, kind: CycleKind, duration: Duration) {
        *self.cycles.entry(kind).or_insert(0) += 1;
        self.cycle_duration.push(duration.as_secs_f64() * 1000.0);
    }

    /// Cycles with the given outcome
    pub fn count(&self, kind: CycleKind) -> u64 {
        self.cycles.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_cycles(&self) -> u64 {
        self.cycles.values().sum()
    }

    /// Generate summary report
    pub fn summary(&self) -> CycleSummary {
        let total = self.total_cycles();
        let skipped = self.count(CycleKind::Skipped);
        CycleSummary {
            total_cycles: total,
            committed: self.count(CycleKind::Committed),
            no_op: self.count(CycleKind::NoOp),
            skipped,
            skip_rate: if total > 0 {
                skipped as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            evictions: self.evictions,
            cycle_duration_ms: StatsSummary::from(&self.cycle_duration),
            step_distance_m: StatsSummary::from(&self.step_distance),
            skip_reasons: self.skip_reasons.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct CycleSummary {
    pub total_cycles: u64,
    pub committed: u64,
    pub no_op: u64,
    pub skipped: u64,
    pub skip_rate: f64,
    pub evictions: u64,
    pub cycle_duration_ms: StatsSummary,
    pub step_distance_m: StatsSummary,
    pub skip_reasons: BTreeMap<&'static str, u64>,
}

impl std::fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Cycle Metrics Summary ===")?;
        writeln!(f, "Total cycles: {}", self.total_cycles)?;
        writeln!(f, "Committed: {}", self.committed)?;
        writeln!(f, "No-op: {}", self.no_op)?;
        writeln!(f, "Skipped: {} ({:.2}%)", self.skipped, self.skip_rate)?;
        writeln!(f, "Evictions: {}", self.evictions)?;
        writeln!(f, "Cycle duration (ms): {}", self.cycle_duration_ms)?;
        writeln!(f, "Step distance (m): {}", self.step_distance_m)?;

        if !self.skip_reasons.is_empty() {
            writeln!(f, "Skip reasons:")?;
            for (reason, count) in &self.skip_reasons {
                writeln!(f, "  {}: {}", reason, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
