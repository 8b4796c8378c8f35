//! # Sensor Store
//!
//! Bounded in-memory history of sensor readings.
//!
//! Responsibilities:
//! - Per-sensor-type FIFO of `SensorReading` (append at tail, evict at head)
//! - Store-assigned, strictly increasing frame ids
//! - Time-driven eviction cadence via `EvictionScheduler`
//!
//! Memory is bounded by eviction cadence, not by a fixed capacity.
//!
//! ## Usage Example
//!
//! ```ignore
//! use sensor_store::{EvictionScheduler, LiveSensorStore};
//!
//! let mut store = LiveSensorStore::new();
//! store.register(SensorType::StereoCamera);
//!
//! let mut scheduler = EvictionScheduler::new();
//! scheduler.schedule(SensorType::StereoCamera, Duration::from_secs(5), Instant::now())?;
//!
//! // once per pipeline cycle
//! store.capture_from(&mut handle).await?;
//! scheduler.tick(Instant::now(), &mut store);
//! ```

mod error;
mod scheduler;
mod store;

pub use contracts::{FrameId, SensorReading, SensorType};
pub use error::{CaptureError, Result};
pub use scheduler::{ClearSchedule, Eviction, EvictionScheduler};
pub use store::{LiveSensorStore, StoreStats};
