//! Per-sensor-type reading FIFO.
//!
//! One `VecDeque<SensorReading>` per sensor type: payload, timestamp and
//! frame id travel together in one record, so they can never disagree in
//! length. Readings enter at the tail and leave from the head only.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use contracts::{
    ContractError, FrameId, Instant, ReadingRegistrar, SensorHandle, SensorReading, SensorType,
};
use tracing::{debug, trace};

use crate::error::{CaptureError, Result};

#[derive(Default)]
struct SensorStream {
    readings: VecDeque<SensorReading>,
    next_frame_id: FrameId,
    evicted_count: u64,
}

impl SensorStream {
    fn last(&self) -> Option<&SensorReading> {
        self.readings.back()
    }
}

/// Bounded live history of sensor readings, keyed by sensor type.
///
/// Invariants per sensor type:
/// - frame ids are strictly increasing
/// - timestamps are non-decreasing
/// - entries are appended at the tail and removed from the head only
#[derive(Default)]
pub struct LiveSensorStore {
    streams: HashMap<SensorType, SensorStream>,
}

impl fmt::Debug for LiveSensorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depths: HashMap<_, _> = self
            .streams
            .iter()
            .map(|(sensor_type, stream)| (*sensor_type, stream.readings.len()))
            .collect();
        f.debug_struct("LiveSensorStore")
            .field("depths", &depths)
            .finish()
    }
}

/// Store status (for diagnostics)
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Retained readings per sensor type
    pub depths: HashMap<SensorType, usize>,

    /// Evicted readings per sensor type since registration
    pub evicted: HashMap<SensorType, u64>,

    /// Total retained readings
    pub total_readings: usize,

    /// Oldest retained timestamp across all types
    pub oldest_timestamp: Option<Instant>,

    /// Newest retained timestamp across all types
    pub newest_timestamp: Option<Instant>,
}

impl LiveSensorStore {
    /// Create an empty store with no registered sensor types
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty sequence for `sensor_type`.
    ///
    /// Re-registering an existing type keeps its history.
    pub fn register(&mut self, sensor_type: SensorType) {
        self.streams.entry(sensor_type).or_insert_with(|| {
            debug!(sensor_type = %sensor_type, "registered sensor stream");
            SensorStream::default()
        });
    }

    /// Whether a sequence exists for `sensor_type`
    pub fn contains(&self, sensor_type: SensorType) -> bool {
        self.streams.contains_key(&sensor_type)
    }

    /// Registered sensor types
    pub fn sensor_types(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.streams.keys().copied()
    }

    /// Append `reading` at the tail of its type's sequence.
    ///
    /// # Errors
    /// - [`ContractError::UnknownSensorType`] if the type was never registered
    /// - [`ContractError::OutOfOrder`] if the reading's frame id does not
    ///   exceed the newest one, or its timestamp precedes the newest one
    pub fn append(&mut self, sensor_type: SensorType, reading: SensorReading) -> Result<FrameId> {
        let stream = self.stream_mut(sensor_type)?;

        if let Some(last) = stream.last() {
            if reading.frame_id <= last.frame_id || reading.timestamp < last.timestamp {
                return Err(ContractError::OutOfOrder {
                    sensor_type,
                    frame_id: reading.frame_id,
                    last_frame_id: last.frame_id,
                });
            }
        }

        let frame_id = reading.frame_id;
        stream.next_frame_id = stream.next_frame_id.max(frame_id + 1);
        stream.readings.push_back(reading);

        trace!(
            sensor_type = %sensor_type,
            frame_id,
            depth = stream.readings.len(),
            "reading appended"
        );
        Ok(frame_id)
    }

    /// Newest reading, `None` when the sequence is empty
    pub fn latest(&self, sensor_type: SensorType) -> Result<Option<&SensorReading>> {
        Ok(self.stream(sensor_type)?.last())
    }

    /// Newest reading and its immediate predecessor, oldest first
    pub fn latest_pair(
        &self,
        sensor_type: SensorType,
    ) -> Result<Option<(&SensorReading, &SensorReading)>> {
        let readings = &self.stream(sensor_type)?.readings;
        let len = readings.len();
        if len < 2 {
            return Ok(None);
        }
        Ok(Some((&readings[len - 2], &readings[len - 1])))
    }

    /// All retained readings, oldest first
    pub fn all(
        &self,
        sensor_type: SensorType,
    ) -> Result<impl Iterator<Item = &SensorReading> + '_> {
        Ok(self.stream(sensor_type)?.readings.iter())
    }

    /// Retained timestamps, oldest first
    pub fn timestamps(&self, sensor_type: SensorType) -> Result<Vec<Instant>> {
        Ok(self.all(sensor_type)?.map(|r| r.timestamp).collect())
    }

    /// Retained frame ids, oldest first
    pub fn frame_ids(&self, sensor_type: SensorType) -> Result<Vec<FrameId>> {
        Ok(self.all(sensor_type)?.map(|r| r.frame_id).collect())
    }

    /// Number of retained readings
    pub fn len(&self, sensor_type: SensorType) -> Result<usize> {
        Ok(self.stream(sensor_type)?.readings.len())
    }

    /// Whether no readings are retained for `sensor_type`
    pub fn is_empty(&self, sensor_type: SensorType) -> Result<bool> {
        Ok(self.stream(sensor_type)?.readings.is_empty())
    }

    /// Frame id the next captured reading will receive
    pub fn next_frame_id(&self, sensor_type: SensorType) -> Result<FrameId> {
        Ok(self.stream(sensor_type)?.next_frame_id)
    }

    /// Remove the oldest reading.
    ///
    /// Empty sequences are a no-op returning `Ok(None)`: the scheduler runs
    /// independently of data arrival.
    pub fn evict_oldest(&mut self, sensor_type: SensorType) -> Result<Option<SensorReading>> {
        let stream = self.stream_mut(sensor_type)?;
        let evicted = stream.readings.pop_front();
        if let Some(reading) = &evicted {
            stream.evicted_count += 1;
            trace!(
                sensor_type = %sensor_type,
                frame_id = reading.frame_id,
                depth = stream.readings.len(),
                "oldest reading evicted"
            );
        }
        Ok(evicted)
    }

    /// Acquire one reading from `handle` and append it.
    ///
    /// The reading is stamped with the capture instant and the next frame id
    /// of the handle's sensor type. Nothing is appended if acquisition fails
    /// or the future is dropped (e.g. by a timeout) before completion.
    ///
    /// # Errors
    /// - [`CaptureError::Contract`] if the handle's type is not registered
    /// - [`CaptureError::Acquire`] if the handle fails to produce a reading
    pub async fn capture_from<H>(&mut self, handle: &mut H) -> std::result::Result<FrameId, CaptureError>
    where
        H: SensorHandle,
    {
        let sensor_type = handle.sensor_type();
        // reject before touching the device
        self.stream(sensor_type)?;

        let payload = handle.acquire().await?;
        let timestamp = Instant::now();

        let stream = self.stream_mut(sensor_type)?;
        let frame_id = stream.next_frame_id;
        let timestamp = stream
            .last()
            .map_or(timestamp, |last| timestamp.max(last.timestamp));

        let reading = SensorReading::new(sensor_type, frame_id, timestamp, payload);
        Ok(self.append(sensor_type, reading)?)
    }

    /// Snapshot of depths and timestamp range
    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats::default();
        for (sensor_type, stream) in &self.streams {
            stats.depths.insert(*sensor_type, stream.readings.len());
            stats.evicted.insert(*sensor_type, stream.evicted_count);
            stats.total_readings += stream.readings.len();

            if let Some(front) = stream.readings.front() {
                stats.oldest_timestamp = Some(
                    stats
                        .oldest_timestamp
                        .map_or(front.timestamp, |t| t.min(front.timestamp)),
                );
            }
            if let Some(back) = stream.readings.back() {
                stats.newest_timestamp = Some(
                    stats
                        .newest_timestamp
                        .map_or(back.timestamp, |t| t.max(back.timestamp)),
                );
            }
        }
        stats
    }

    fn stream(&self, sensor_type: SensorType) -> Result<&SensorStream> {
        self.streams
            .get(&sensor_type)
            .ok_or_else(|| ContractError::unknown_sensor_type(sensor_type))
    }

    fn stream_mut(&mut self, sensor_type: SensorType) -> Result<&mut SensorStream> {
        self.streams
            .get_mut(&sensor_type)
            .ok_or_else(|| ContractError::unknown_sensor_type(sensor_type))
    }
}

impl ReadingRegistrar for LiveSensorStore {
    fn register_sensor_type(&mut self, sensor_type: SensorType) {
        self.register(sensor_type);
    }

    fn is_registered(&self, sensor_type: SensorType) -> bool {
        self.contains(sensor_type)
    }
}
