//! End-of-run summary.

use std::collections::BTreeMap;

use odometry::{PipelineStats, StopReason};
use serde::Serialize;

/// Serializable view of the final pipeline statistics
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub stop_reason: Option<StopReason>,
    pub duration_secs: f64,
    pub cycles: u64,
    pub committed: u64,
    pub no_op: u64,
    pub skipped: u64,
    pub cycles_per_sec: f64,
    pub evictions: u64,
    pub distance_m: f64,
    pub final_translation: [f64; 3],
    pub final_rotation: [[f64; 3]; 3],
    pub map_points: usize,
    pub reads: ReadSummary,
    pub mean_cycle_ms: f64,
    pub skip_reasons: BTreeMap<&'static str, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadSummary {
    pub captured: u64,
    pub disconnected: u64,
    pub timed_out: u64,
    pub failed: u64,
}

impl From<&PipelineStats> for RunSummary {
    fn from(stats: &PipelineStats) -> Self {
        let t = stats.final_pose.translation();
        let r = stats.final_pose.rotation();
        let cycle_summary = stats.cycle_metrics.summary();

        Self {
            stop_reason: stats.stop_reason,
            duration_secs: stats.duration.as_secs_f64(),
            cycles: stats.cycles,
            committed: stats.committed,
            no_op: stats.no_op,
            skipped: stats.skipped,
            cycles_per_sec: stats.cycles_per_sec(),
            evictions: stats.evictions,
            distance_m: stats.distance_m,
            final_translation: [t.x, t.y, t.z],
            final_rotation: std::array::from_fn(|i| std::array::from_fn(|j| r[(i, j)])),
            map_points: stats.map_points,
            reads: ReadSummary {
                captured: stats.reads.captured,
                disconnected: stats.reads.disconnected,
                timed_out: stats.reads.timed_out,
                failed: stats.reads.failed,
            },
            mean_cycle_ms: cycle_summary.cycle_duration_ms.mean,
            skip_reasons: cycle_summary.skip_reasons,
        }
    }
}

impl RunSummary {
    /// Print detailed summary
    pub fn print(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Odometry Summary                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        let stop_reason = self
            .stop_reason
            .map_or("running", |reason| reason.as_str());

        println!("📊 Overview");
        println!("   ├─ Stop reason: {stop_reason}");
        println!("   ├─ Duration: {:.2}s", self.duration_secs);
        println!("   ├─ Cycles: {}", self.cycles);
        println!("   ├─ Cycles/s: {:.2}", self.cycles_per_sec);
        println!("   └─ Mean cycle: {:.2}ms", self.mean_cycle_ms);

        println!("\n🧭 Trajectory");
        let [x, y, z] = self.final_translation;
        println!("   ├─ Final position: ({x:.3}, {y:.3}, {z:.3}) m");
        println!("   ├─ Distance travelled: {:.3} m", self.distance_m);
        println!("   └─ Map points: {}", self.map_points);

        println!("\n📈 Cycle Outcomes");
        println!("   ├─ Committed: {}", self.committed);
        println!("   ├─ No-op: {}", self.no_op);
        println!("   ├─ Skipped: {}", self.skipped);
        println!("   └─ Evictions: {}", self.evictions);

        println!("\n📷 Reads");
        println!("   ├─ Captured: {}", self.reads.captured);
        println!("   ├─ Timed out: {}", self.reads.timed_out);
        println!("   ├─ Failed: {}", self.reads.failed);
        println!("   └─ Disconnected: {}", self.reads.disconnected);

        if !self.skip_reasons.is_empty() {
            println!("\n⚠️  Skip Reasons");
            for (reason, count) in &self.skip_reasons {
                println!("   ├─ {reason}: {count}");
            }
        }

        println!();
    }
}
