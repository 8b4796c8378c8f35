//! Time-driven eviction cadence.
//!
//! Each sensor type has its own clear interval and next clear time. On every
//! tick at most one reading per due type is dropped from the head of the
//! store, so retained history is bounded by how often readings arrive
//! relative to the clear interval.

use std::collections::HashMap;
use std::time::Duration;

use contracts::{ContractError, FrameId, Instant, SensorType};
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::store::LiveSensorStore;

/// Eviction cadence of one sensor type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearSchedule {
    /// Time between two evictions
    pub clear_interval: Duration,

    /// Earliest instant the next eviction may fire
    pub next_clear_time: Instant,
}

/// One eviction slot that fired during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eviction {
    pub sensor_type: SensorType,

    /// Frame id of the dropped reading, `None` if the sequence was empty
    pub frame_id: Option<FrameId>,

    /// Slots still due after this one, each caught up by a later tick
    pub overdue_slots: u32,
}

/// Per-sensor-type eviction schedule
#[derive(Debug, Default)]
pub struct EvictionScheduler {
    schedules: HashMap<SensorType, ClearSchedule>,
}

impl EvictionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cadence for `sensor_type`: the first eviction is due at
    /// `start + clear_interval`. Re-scheduling resets the cadence.
    ///
    /// # Errors
    /// [`ContractError::InvalidInterval`] if `clear_interval` is zero
    pub fn schedule(
        &mut self,
        sensor_type: SensorType,
        clear_interval: Duration,
        start: Instant,
    ) -> Result<()> {
        check_interval(sensor_type, clear_interval)?;

        let schedule = ClearSchedule {
            clear_interval,
            next_clear_time: start + clear_interval,
        };
        debug!(
            sensor_type = %sensor_type,
            clear_interval_ms = clear_interval.as_millis() as u64,
            "eviction scheduled"
        );
        self.schedules.insert(sensor_type, schedule);
        Ok(())
    }

    /// Change the interval of an existing cadence.
    ///
    /// The already-computed next clear time is kept; the new interval applies
    /// from the following eviction on.
    ///
    /// # Errors
    /// - [`ContractError::UnknownSensorType`] if no cadence exists
    /// - [`ContractError::InvalidInterval`] if `clear_interval` is zero
    pub fn set_clear_interval(
        &mut self,
        sensor_type: SensorType,
        clear_interval: Duration,
    ) -> Result<()> {
        check_interval(sensor_type, clear_interval)?;
        let schedule = self
            .schedules
            .get_mut(&sensor_type)
            .ok_or_else(|| ContractError::unknown_sensor_type(sensor_type))?;
        schedule.clear_interval = clear_interval;
        Ok(())
    }

    /// Current interval for `sensor_type`
    pub fn clear_interval(&self, sensor_type: SensorType) -> Result<Duration> {
        Ok(self.get(sensor_type)?.clear_interval)
    }

    /// Next instant an eviction is due for `sensor_type`
    pub fn next_clear_time(&self, sensor_type: SensorType) -> Result<Instant> {
        Ok(self.get(sensor_type)?.next_clear_time)
    }

    /// Schedule of `sensor_type`
    pub fn get(&self, sensor_type: SensorType) -> Result<&ClearSchedule> {
        self.schedules
            .get(&sensor_type)
            .ok_or_else(|| ContractError::unknown_sensor_type(sensor_type))
    }

    /// Scheduled sensor types
    pub fn sensor_types(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.schedules.keys().copied()
    }

    /// Fire every due eviction.
    ///
    /// For each scheduled type with `now >= next_clear_time`, drop the oldest
    /// reading (no-op on an empty sequence) and advance the next clear time by
    /// exactly one interval. A late tick still evicts only once; the overdue
    /// slots stay due and each following tick catches up one of them. Types
    /// the store does not know are left untouched.
    #[instrument(name = "eviction_tick", skip(self, store))]
    pub fn tick(&mut self, now: Instant, store: &mut LiveSensorStore) -> Vec<Eviction> {
        let mut fired = Vec::new();

        for (sensor_type, schedule) in self.schedules.iter_mut() {
            if now < schedule.next_clear_time {
                continue;
            }

            let frame_id = match store.evict_oldest(*sensor_type) {
                Ok(evicted) => evicted.map(|r| r.frame_id),
                Err(e) => {
                    warn!(sensor_type = %sensor_type, error = %e, "eviction skipped");
                    continue;
                }
            };

            schedule.next_clear_time += schedule.clear_interval;
            let overdue_slots = overdue(schedule, now);

            if frame_id.is_some() {
                metrics::counter!(
                    "stereo_odometry_evictions_total",
                    "sensor_type" => sensor_type.as_str()
                )
                .increment(1);
            }
            if overdue_slots > 0 {
                debug!(
                    sensor_type = %sensor_type,
                    overdue_slots,
                    "eviction behind schedule, catching up"
                );
            }

            fired.push(Eviction {
                sensor_type: *sensor_type,
                frame_id,
                overdue_slots,
            });
        }

        fired
    }
}

fn check_interval(sensor_type: SensorType, clear_interval: Duration) -> Result<()> {
    if clear_interval.is_zero() {
        return Err(ContractError::InvalidInterval {
            sensor_type,
            interval_ms: clear_interval.as_millis(),
        });
    }
    Ok(())
}

/// Number of slots at or before `now`, saturating at `u32::MAX`
fn overdue(schedule: &ClearSchedule, now: Instant) -> u32 {
    if schedule.next_clear_time > now {
        return 0;
    }

    let behind = now - schedule.next_clear_time;
    let slots = behind.as_nanos() / schedule.clear_interval.as_nanos();
    u32::try_from(slots).unwrap_or(u32::MAX).saturating_add(1)
}
