//! Read-only view of the pipeline's committed state

use std::sync::Arc;

use contracts::{FrameId, Map, Pose};
use tokio::sync::watch;

use crate::state::PipelineState;

/// State committed at the end of a cycle
///
/// Pose and map always belong to the same cycle.
#[derive(Debug, Clone)]
pub struct PipelineSnapshot {
    /// Cycles completed so far
    pub cycle: u64,
    pub state: PipelineState,
    pub pose: Pose,
    pub map: Arc<Map>,
    /// Frame that produced the current pose, `None` before the first commit
    pub last_frame_id: Option<FrameId>,
}

impl Default for PipelineSnapshot {
    fn default() -> Self {
        Self {
            cycle: 0,
            state: PipelineState::Starting,
            pose: Pose::identity(),
            map: Arc::new(Map::new()),
            last_frame_id: None,
        }
    }
}

/// Observer handle; cheap to clone, usable from any task
#[derive(Debug, Clone)]
pub struct PipelineObserver {
    rx: watch::Receiver<PipelineSnapshot>,
}

impl PipelineObserver {
    pub(crate) fn new(rx: watch::Receiver<PipelineSnapshot>) -> Self {
        Self { rx }
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.rx.borrow().clone()
    }

    pub fn pose(&self) -> Pose {
        self.rx.borrow().pose
    }

    pub fn map(&self) -> Arc<Map> {
        Arc::clone(&self.rx.borrow().map)
    }

    pub fn state(&self) -> PipelineState {
        self.rx.borrow().state
    }

    pub fn cycle(&self) -> u64 {
        self.rx.borrow().cycle
    }

    /// Wait for the next publication; `None` once the pipeline is dropped
    pub async fn changed(&mut self) -> Option<PipelineSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until the pipeline reaches `Stopped`
    pub async fn stopped(&mut self) -> PipelineSnapshot {
        let result = self
            .rx
            .wait_for(|s| s.state == PipelineState::Stopped)
            .await
            .map(|s| (*s).clone());
        result.unwrap_or_else(|_| self.snapshot())
    }
}
