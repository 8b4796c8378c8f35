//! SensorRegistry main entry

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::{FrameId, InitError, Instant, SensorHandle, SensorStatus, SensorType};
use sensor_store::{CaptureError, LiveSensorStore};
use tracing::{debug, info, instrument, warn};

use crate::error::{RegistryError, Result};

struct RegisteredSensor<H> {
    handle: H,
    acquire_timeout: Duration,
    status: SensorStatus,
}

/// Read outcome counters (for diagnostics)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCounters {
    /// Readings appended to the store
    pub captured: u64,

    /// Reads refused because the handle reported disconnected
    pub disconnected: u64,

    /// Reads that exceeded the acquisition timeout
    pub timed_out: u64,

    /// Reads whose acquisition failed
    pub failed: u64,
}

/// Sensor Registry
///
/// Owns the sensor handles and the single live store. Every read goes
/// through the store, so the handles never touch reading history directly.
///
/// Generic over one handle type; heterogeneous sensors are expressed as an
/// enum implementing `SensorHandle`.
pub struct SensorRegistry<H> {
    sensors: BTreeMap<SensorType, RegisteredSensor<H>>,
    store: LiveSensorStore,
    counters: ReadCounters,
}

impl<H: SensorHandle> Default for SensorRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: SensorHandle> SensorRegistry<H> {
    /// Create an empty registry with an empty store
    pub fn new() -> Self {
        Self {
            sensors: BTreeMap::new(),
            store: LiveSensorStore::new(),
            counters: ReadCounters::default(),
        }
    }

    /// Register `handle` under its own sensor type.
    ///
    /// The handle stays `Uninitialized` until `initialize` runs.
    #[instrument(
        name = "registry_register",
        skip(self, handle),
        fields(sensor_type = %handle.sensor_type())
    )]
    pub fn register(&mut self, handle: H, acquire_timeout: Duration) -> Result<()> {
        let sensor_type = handle.sensor_type();
        if acquire_timeout.is_zero() {
            return Err(RegistryError::InvalidTimeout { sensor_type });
        }
        if self.sensors.contains_key(&sensor_type) {
            return Err(RegistryError::DuplicateSensor { sensor_type });
        }

        self.sensors.insert(
            sensor_type,
            RegisteredSensor {
                handle,
                acquire_timeout,
                status: SensorStatus::Uninitialized,
            },
        );
        debug!(
            acquire_timeout_ms = acquire_timeout.as_millis() as u64,
            "registered sensor handle"
        );
        Ok(())
    }

    /// Initialize one handle, handing it the store to register its history.
    ///
    /// Records `Connected`/`Disconnected` on success and `Failed` on error.
    #[instrument(name = "registry_initialize", skip(self), fields(sensor_type = %sensor_type))]
    pub fn initialize(&mut self, sensor_type: SensorType) -> Result<()> {
        let sensor = self
            .sensors
            .get_mut(&sensor_type)
            .ok_or_else(|| RegistryError::unknown_sensor_type(sensor_type))?;

        match sensor.handle.initialize(&mut self.store) {
            Ok(()) => {
                sensor.status = probe(&sensor.handle);
                info!(status = ?sensor.status, "sensor initialized");
                Ok(())
            }
            Err(source) => {
                sensor.status = SensorStatus::Failed;
                warn!(error = %source, "sensor initialization failed");
                Err(RegistryError::Init {
                    sensor_type,
                    source,
                })
            }
        }
    }

    /// Initialize every registered handle.
    ///
    /// One failure does not prevent the others from initializing.
    #[instrument(name = "registry_initialize_all", skip(self))]
    pub fn initialize_all(&mut self) -> BTreeMap<SensorType, std::result::Result<(), InitError>> {
        let sensor_types: Vec<_> = self.sensors.keys().copied().collect();
        let mut results = BTreeMap::new();

        for sensor_type in sensor_types {
            let result = match self.initialize(sensor_type) {
                Ok(()) => Ok(()),
                Err(RegistryError::Init { source, .. }) => Err(source),
                Err(other) => Err(InitError::device(other.to_string())),
            };
            results.insert(sensor_type, result);
        }

        let failed = results.values().filter(|r| r.is_err()).count();
        info!(
            total = results.len(),
            failed, "sensor initialization complete"
        );
        results
    }

    /// Capture one reading from `sensor_type` into the store.
    ///
    /// The handle's connection is probed first; a disconnected handle is not
    /// read and its status is recorded. The acquisition is bounded by the
    /// handle's timeout; nothing is appended if it expires.
    #[instrument(name = "registry_read", skip(self), fields(sensor_type = %sensor_type))]
    pub async fn read(&mut self, sensor_type: SensorType) -> Result<FrameId> {
        let sensor = self
            .sensors
            .get_mut(&sensor_type)
            .ok_or_else(|| RegistryError::unknown_sensor_type(sensor_type))?;

        match sensor.status {
            SensorStatus::Uninitialized | SensorStatus::Failed | SensorStatus::ShutDown => {
                return Err(RegistryError::NotReady {
                    sensor_type,
                    status: sensor.status,
                });
            }
            SensorStatus::Connected | SensorStatus::Disconnected => {}
        }

        sensor.status = probe(&sensor.handle);
        if !sensor.status.is_connected() {
            self.counters.disconnected += 1;
            record_read(sensor_type, "disconnected");
            warn!("sensor disconnected, read not attempted");
            return Err(RegistryError::SensorDisconnected { sensor_type });
        }

        let started = Instant::now();
        let timeout = sensor.acquire_timeout;
        let outcome =
            tokio::time::timeout(timeout, self.store.capture_from(&mut sensor.handle)).await;

        metrics::histogram!(
            "stereo_odometry_acquire_latency_ms",
            "sensor_type" => sensor_type.as_str()
        )
        .record(started.elapsed().as_secs_f64() * 1000.0);

        match outcome {
            Ok(Ok(frame_id)) => {
                self.counters.captured += 1;
                record_read(sensor_type, "captured");
                metrics::gauge!(
                    "stereo_odometry_store_depth",
                    "sensor_type" => sensor_type.as_str()
                )
                .set(self.store.len(sensor_type).unwrap_or_default() as f64);
                debug!(frame_id, "reading captured");
                Ok(frame_id)
            }
            Ok(Err(CaptureError::Acquire(source))) => {
                self.counters.failed += 1;
                record_read(sensor_type, "failed");
                warn!(error = %source, "acquisition failed");
                Err(RegistryError::Acquire {
                    sensor_type,
                    source,
                })
            }
            Ok(Err(CaptureError::Contract(e))) => Err(e.into()),
            Err(_elapsed) => {
                self.counters.timed_out += 1;
                record_read(sensor_type, "timeout");
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "acquisition timed out"
                );
                Err(RegistryError::AcquireTimeout {
                    sensor_type,
                    timeout,
                })
            }
        }
    }

    /// Read every registered sensor once, in sensor type order
    pub async fn read_all(&mut self) -> BTreeMap<SensorType, Result<FrameId>> {
        let sensor_types: Vec<_> = self.sensors.keys().copied().collect();
        let mut results = BTreeMap::new();
        for sensor_type in sensor_types {
            results.insert(sensor_type, self.read(sensor_type).await);
        }
        results
    }

    /// Last-known status; never probes the device
    pub fn status(&self, sensor_type: SensorType) -> Result<SensorStatus> {
        self.sensors
            .get(&sensor_type)
            .map(|s| s.status)
            .ok_or_else(|| RegistryError::unknown_sensor_type(sensor_type))
    }

    /// Last-known status of every registered sensor
    pub fn status_all(&self) -> BTreeMap<SensorType, SensorStatus> {
        self.sensors
            .iter()
            .map(|(sensor_type, s)| (*sensor_type, s.status))
            .collect()
    }

    /// Probe the device now and refresh the cached status.
    ///
    /// Handles that are not initialized (or already shut down) keep their
    /// status and report `false`.
    pub fn check_connection(&mut self, sensor_type: SensorType) -> Result<bool> {
        let sensor = self
            .sensors
            .get_mut(&sensor_type)
            .ok_or_else(|| RegistryError::unknown_sensor_type(sensor_type))?;

        if matches!(
            sensor.status,
            SensorStatus::Connected | SensorStatus::Disconnected
        ) {
            sensor.status = probe(&sensor.handle);
        }
        Ok(sensor.status.is_connected())
    }

    /// Release one handle. Calling it again is a no-op.
    #[instrument(name = "registry_shutdown", skip(self), fields(sensor_type = %sensor_type))]
    pub fn shutdown(&mut self, sensor_type: SensorType) -> Result<()> {
        let sensor = self
            .sensors
            .get_mut(&sensor_type)
            .ok_or_else(|| RegistryError::unknown_sensor_type(sensor_type))?;

        if sensor.status == SensorStatus::ShutDown {
            debug!("sensor already shut down");
            return Ok(());
        }

        sensor.handle.shutdown();
        sensor.status = SensorStatus::ShutDown;
        info!("sensor shut down");
        Ok(())
    }

    /// Release every handle. Idempotent.
    #[instrument(name = "registry_shutdown_all", skip(self))]
    pub fn shutdown_all(&mut self) {
        let sensor_types: Vec<_> = self.sensors.keys().copied().collect();
        for sensor_type in sensor_types {
            // every key comes from `self.sensors`
            let _ = self.shutdown(sensor_type);
        }
    }

    /// Live store (read-only)
    pub fn store(&self) -> &LiveSensorStore {
        &self.store
    }

    /// Live store (for eviction)
    pub fn store_mut(&mut self) -> &mut LiveSensorStore {
        &mut self.store
    }

    /// Registered handle of `sensor_type`
    pub fn handle(&self, sensor_type: SensorType) -> Option<&H> {
        self.sensors.get(&sensor_type).map(|s| &s.handle)
    }

    /// Acquisition timeout of `sensor_type`
    pub fn acquire_timeout(&self, sensor_type: SensorType) -> Result<Duration> {
        self.sensors
            .get(&sensor_type)
            .map(|s| s.acquire_timeout)
            .ok_or_else(|| RegistryError::unknown_sensor_type(sensor_type))
    }

    /// Registered sensor types, ordered
    pub fn sensor_types(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.sensors.keys().copied()
    }

    /// Get registered sensor count
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Read outcome counters since creation
    pub fn counters(&self) -> ReadCounters {
        self.counters
    }
}

fn probe<H: SensorHandle>(handle: &H) -> SensorStatus {
    if handle.check_connection() {
        SensorStatus::Connected
    } else {
        SensorStatus::Disconnected
    }
}

fn record_read(sensor_type: SensorType, outcome: &'static str) {
    metrics::counter!(
        "stereo_odometry_reads_total",
        "sensor_type" => sensor_type.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}
