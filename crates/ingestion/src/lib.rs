//! # Ingestion
//!
//! Sensor registry module.
//!
//! Responsibilities:
//! - Own the registered sensor handles and the single `LiveSensorStore`
//! - Initialize handles, isolating per-sensor failures
//! - Per-cycle reads bounded by the acquisition timeout
//! - Cached connection status and idempotent shutdown
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::SensorRegistry;
//!
//! let mut registry = SensorRegistry::new();
//! registry.register(handle, Duration::from_secs(1))?;
//!
//! for (sensor_type, result) in registry.initialize_all() {
//!     // per-sensor outcome
//! }
//!
//! match registry.read(SensorType::StereoCamera).await {
//!     Ok(frame_id) => { /* reading appended to registry.store() */ }
//!     Err(e) if e.is_recoverable() => { /* skip cycle */ }
//!     Err(e) => { /* disconnected / not ready */ }
//! }
//!
//! registry.shutdown_all();
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::{MockSensorControl, MockSensorHandle};
//!
//! let control = MockSensorControl::new();
//! let handle = MockSensorHandle::new(SensorType::StereoCamera, control.clone());
//! control.set_connected(false);
//! ```

mod error;
mod mock;
mod registry;

pub use error::{RegistryError, Result};
pub use mock::{MockSensorControl, MockSensorHandle};
pub use registry::{ReadCounters, SensorRegistry};
