//! Mock sensor handle
//!
//! Scriptable `SensorHandle` for tests without a rig. A shared
//! `MockSensorControl` flips connection state, injects acquisition delay,
//! queues payloads or failures, and counts calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use contracts::{
    AcquireError, InitError, ReadingRegistrar, SensorHandle, SensorPayload, SensorType,
};
use tracing::trace;

#[derive(Debug, Default)]
struct MockState {
    connected: AtomicBool,
    delay_ms: AtomicU64,
    init_calls: AtomicU64,
    acquire_calls: AtomicU64,
    shutdown_calls: AtomicU64,
    init_failure: Mutex<Option<InitError>>,
    script: Mutex<VecDeque<Result<SensorPayload, AcquireError>>>,
}

/// Shared control surface of a `MockSensorHandle`
#[derive(Debug, Clone)]
pub struct MockSensorControl {
    state: Arc<MockState>,
}

impl Default for MockSensorControl {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSensorControl {
    /// Connected, no delay, empty script
    pub fn new() -> Self {
        let state = MockState::default();
        state.connected.store(true, Ordering::SeqCst);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.connected.store(connected, Ordering::SeqCst);
    }

    /// Delay applied to every subsequent `acquire`
    pub fn set_acquire_delay(&self, delay: Duration) {
        self.state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make the next `initialize` fail with `error`
    pub fn fail_init(&self, error: InitError) {
        *lock(&self.state.init_failure) = Some(error);
    }

    /// Queue the result of one future `acquire`
    pub fn push_payload(&self, payload: SensorPayload) {
        lock(&self.state.script).push_back(Ok(payload));
    }

    /// Queue a failure for one future `acquire`
    pub fn push_failure(&self, error: AcquireError) {
        lock(&self.state.script).push_back(Err(error));
    }

    pub fn init_calls(&self) -> u64 {
        self.state.init_calls.load(Ordering::SeqCst)
    }

    pub fn acquire_calls(&self) -> u64 {
        self.state.acquire_calls.load(Ordering::SeqCst)
    }

    pub fn shutdown_calls(&self) -> u64 {
        self.state.shutdown_calls.load(Ordering::SeqCst)
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    fn acquire_delay(&self) -> Duration {
        Duration::from_millis(self.state.delay_ms.load(Ordering::SeqCst))
    }

    fn next_result(&self) -> Result<SensorPayload, AcquireError> {
        lock(&self.state.script)
            .pop_front()
            .unwrap_or_else(|| Ok(SensorPayload::Raw(Bytes::from_static(b"mock"))))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock sensor handle
///
/// Yields queued results in order; once the script is empty every
/// `acquire` returns a small raw payload.
#[derive(Debug)]
pub struct MockSensorHandle {
    sensor_type: SensorType,
    control: MockSensorControl,
    initialized: bool,
}

impl MockSensorHandle {
    pub fn new(sensor_type: SensorType, control: MockSensorControl) -> Self {
        Self {
            sensor_type,
            control,
            initialized: false,
        }
    }

    pub fn control(&self) -> &MockSensorControl {
        &self.control
    }
}

impl SensorHandle for MockSensorHandle {
    fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    fn initialize(&mut self, registrar: &mut dyn ReadingRegistrar) -> Result<(), InitError> {
        self.control.state.init_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = lock(&self.control.state.init_failure).take() {
            return Err(error);
        }
        if !self.control.is_connected() {
            return Err(InitError::NotConnected);
        }

        registrar.register_sensor_type(self.sensor_type);
        self.initialized = true;
        Ok(())
    }

    async fn acquire(&mut self) -> Result<SensorPayload, AcquireError> {
        self.control.state.acquire_calls.fetch_add(1, Ordering::SeqCst);
        if !self.initialized {
            return Err(AcquireError::NotInitialized);
        }

        let delay = self.control.acquire_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = self.control.next_result();
        trace!(sensor_type = %self.sensor_type, ok = result.is_ok(), "mock acquire");
        result
    }

    fn check_connection(&self) -> bool {
        self.initialized && self.control.is_connected()
    }

    fn shutdown(&mut self) {
        // counts every call so callers can verify they release once
        self.control
            .state
            .shutdown_calls
            .fetch_add(1, Ordering::SeqCst);
        self.initialized = false;
    }
}
