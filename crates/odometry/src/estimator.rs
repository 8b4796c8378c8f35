//! PoseChangeEstimator trait - motion between two stored readings

use contracts::{PoseChange, SensorReading};

/// Derives the motion between two consecutive readings of the driving sensor.
///
/// `None` means no change can be derived from this pair; the cycle is then a
/// no-op. Any `FnMut(&SensorReading, &SensorReading) -> Option<PoseChange>`
/// is an estimator.
pub trait PoseChangeEstimator: Send {
    fn estimate(&mut self, previous: &SensorReading, current: &SensorReading)
        -> Option<PoseChange>;
}

impl<F> PoseChangeEstimator for F
where
    F: FnMut(&SensorReading, &SensorReading) -> Option<PoseChange> + Send,
{
    fn estimate(
        &mut self,
        previous: &SensorReading,
        current: &SensorReading,
    ) -> Option<PoseChange> {
        self(previous, current)
    }
}

/// Takes the odometry the stereo capability reported for the current frame
/// pair. Both readings must carry stereo measurements.
#[derive(Debug, Clone, Copy, Default)]
pub struct OdometryDeltaEstimator;

impl PoseChangeEstimator for OdometryDeltaEstimator {
    fn estimate(
        &mut self,
        previous: &SensorReading,
        current: &SensorReading,
    ) -> Option<PoseChange> {
        if current.frame_id <= previous.frame_id {
            return None;
        }
        previous.stereo()?;
        current.stereo().map(|m| m.odometry)
    }
}
