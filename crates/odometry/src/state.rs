//! Pipeline states and cycle outcomes

use std::fmt;

use contracts::FrameId;
use serde::{Deserialize, Serialize};

/// Pipeline lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Registry and store being initialized
    Starting,
    /// Cycles repeating
    Running,
    /// Releasing sensors after a stop condition
    Stopping,
    /// Terminal; pose and map keep the last committed state
    Stopped,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Starting => "starting",
            PipelineState::Running => "running",
            PipelineState::Stopping => "stopping",
            PipelineState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the pipeline left `Running`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// External stop signal observed at a cycle boundary
    StopRequested,
    /// Driving sensor reported disconnected
    SensorDisconnected,
    /// Configured cycle limit reached
    MaxCycles,
    /// Never reached `Running`
    InitializationFailed,
    /// A cycle failed with an unrecoverable error
    Fault,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::StopRequested => "stop_requested",
            StopReason::SensorDisconnected => "sensor_disconnected",
            StopReason::MaxCycles => "max_cycles",
            StopReason::InitializationFailed => "initialization_failed",
            StopReason::Fault => "fault",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one `run_cycle`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Pose and map updated from the newest reading pair
    Committed {
        frame_id: FrameId,
        /// Points folded into the map
        points: usize,
    },
    /// Reading captured but no pose change derivable; pose and map untouched
    NoOp { frame_id: FrameId },
    /// Read failed or timed out; pose and map untouched
    Skipped { reason: &'static str },
    /// Stop condition fired at the top of the cycle
    Stopped(StopReason),
}

impl CycleOutcome {
    /// Whether pose and map changed
    pub fn is_committed(&self) -> bool {
        matches!(self, CycleOutcome::Committed { .. })
    }
}
