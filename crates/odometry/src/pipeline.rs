//! Processing pipeline
//!
//! One cycle:
//! 1. Poll the stop signal and the driving sensor's cached status
//! 2. Capture one reading from the driving sensor (bounded by its timeout)
//! 3. Derive the pose change from the two newest readings
//! 4. Compose the pose and fold the new cloud into the map
//! 5. Let the eviction scheduler act on every registered sequence
//! 6. Publish pose and map together
//!
//! A failed or timed-out capture skips steps 3 and 4 but still runs 5.

use std::sync::Arc;

use contracts::{FrameId, Instant, Map, Pose, SensorHandle, StopSignal};
use ingestion::{RegistryError, SensorRegistry};
use observability::{record_cycle, record_pose, record_skip, record_state, CycleKind};
use sensor_store::EvictionScheduler;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::estimator::{OdometryDeltaEstimator, PoseChangeEstimator};
use crate::fusion;
use crate::observer::{PipelineObserver, PipelineSnapshot};
use crate::state::{CycleOutcome, PipelineState, StopReason};
use crate::stats::PipelineStats;
use crate::stop::NeverStop;

/// Processing Pipeline
///
/// Owns the registry (and through it the live store), the eviction
/// scheduler and the committed pose/map. Only the pipeline mutates pose and
/// map; everyone else reads published snapshots via [`PipelineObserver`].
pub struct ProcessingPipeline<H, E = OdometryDeltaEstimator> {
    config: PipelineConfig,
    registry: SensorRegistry<H>,
    scheduler: EvictionScheduler,
    estimator: E,
    stop_signal: Box<dyn StopSignal>,
    state: PipelineState,
    publisher: watch::Sender<PipelineSnapshot>,
    stats: PipelineStats,
    started_at: Option<Instant>,
}

impl<H: SensorHandle> ProcessingPipeline<H> {
    pub fn new(registry: SensorRegistry<H>, config: PipelineConfig) -> Self {
        let (publisher, _) = watch::channel(PipelineSnapshot::default());
        Self {
            config,
            registry,
            scheduler: EvictionScheduler::new(),
            estimator: OdometryDeltaEstimator,
            stop_signal: Box::new(NeverStop),
            state: PipelineState::Starting,
            publisher,
            stats: PipelineStats::default(),
            started_at: None,
        }
    }
}

impl<H: SensorHandle, E: PoseChangeEstimator> ProcessingPipeline<H, E> {
    /// Replace the pose change estimator
    pub fn with_estimator<E2: PoseChangeEstimator>(self, estimator: E2) -> ProcessingPipeline<H, E2> {
        ProcessingPipeline {
            config: self.config,
            registry: self.registry,
            scheduler: self.scheduler,
            estimator,
            stop_signal: self.stop_signal,
            state: self.state,
            publisher: self.publisher,
            stats: self.stats,
            started_at: self.started_at,
        }
    }

    /// Stop predicate polled at every cycle boundary
    pub fn with_stop_signal(mut self, signal: impl StopSignal + 'static) -> Self {
        self.stop_signal = Box::new(signal);
        self
    }

    /// Pose before the first committed cycle (identity by default)
    pub fn with_initial_pose(self, pose: Pose) -> Self {
        self.publisher.send_modify(|s| s.pose = pose);
        self
    }

    pub fn observer(&self) -> PipelineObserver {
        PipelineObserver::new(self.publisher.subscribe())
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn pose(&self) -> Pose {
        self.publisher.borrow().pose
    }

    pub fn map(&self) -> Arc<Map> {
        Arc::clone(&self.publisher.borrow().map)
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.publisher.borrow().clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SensorRegistry<H> {
        &self.registry
    }

    pub fn scheduler(&self) -> &EvictionScheduler {
        &self.scheduler
    }

    /// Statistics so far; final once the pipeline is `Stopped`
    pub fn stats(&self) -> PipelineStats {
        let snapshot = self.publisher.borrow();
        let mut stats = self.stats.clone();
        stats.final_pose = snapshot.pose;
        stats.map_points = snapshot.map.len();
        stats.reads = self.registry.counters();
        if stats.stop_reason.is_none() {
            stats.duration = self.started_at.map(|t| t.elapsed()).unwrap_or_default();
        }
        stats
    }

    /// Initialize every sensor and enter `Running`.
    ///
    /// Failures of non-driving sensors are logged and tolerated. If the
    /// driving sensor is missing, fails to initialize or is not connected,
    /// every handle is shut down and the pipeline ends in `Stopped`.
    #[instrument(
        name = "pipeline_start",
        skip(self),
        fields(driving_sensor = %self.config.driving_sensor)
    )]
    pub fn start(&mut self) -> Result<()> {
        self.expect_state(PipelineState::Starting)?;
        self.config.validate()?;
        self.started_at = Some(Instant::now());

        let driving = self.config.driving_sensor;
        let mut results = self.registry.initialize_all();

        for (sensor_type, result) in &results {
            if *sensor_type == driving {
                continue;
            }
            if let Err(e) = result {
                warn!(sensor_type = %sensor_type, error = %e, "auxiliary sensor unavailable");
            }
        }

        let failure = match results.remove(&driving) {
            None => Some(PipelineError::initialization_failed(
                driving,
                "no handle registered",
            )),
            Some(Err(source)) => Some(PipelineError::InitializationFailed {
                sensor_type: driving,
                reason: source.to_string(),
                source: Some(source),
            }),
            Some(Ok(())) => {
                let status = self.registry.status(driving)?;
                (!status.is_connected()).then(|| {
                    PipelineError::initialization_failed(
                        driving,
                        format!("sensor is {status:?} after initialization"),
                    )
                })
            }
        };

        if let Some(e) = failure {
            error!(error = %e, "pipeline failed to start");
            self.stop(StopReason::InitializationFailed);
            return Err(e);
        }

        let now = Instant::now();
        let sensor_types: Vec<_> = self.registry.store().sensor_types().collect();
        for sensor_type in sensor_types {
            self.scheduler
                .schedule(sensor_type, self.config.clear_interval(sensor_type), now)?;
        }

        self.transition(PipelineState::Running);
        Ok(())
    }

    /// Run one cycle.
    ///
    /// Returns `Stopped` when a stop condition was observed at the start of
    /// the cycle; the pipeline is then `Stopped` and pose/map keep their
    /// last committed values. An error from within the cycle stops the
    /// pipeline with [`StopReason::Fault`] before it is returned.
    #[instrument(name = "pipeline_cycle", skip(self), fields(cycle = self.stats.cycles + 1))]
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        self.expect_state(PipelineState::Running)?;

        match self.cycle().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(error = %e, "cycle failed");
                self.stop(StopReason::Fault);
                Err(e)
            }
        }
    }

    async fn cycle(&mut self) -> Result<CycleOutcome> {
        let driving = self.config.driving_sensor;
        let cycle_started = Instant::now();

        if self.stop_signal.stop_requested() {
            return Ok(self.stop(StopReason::StopRequested));
        }
        if !self.registry.status(driving)?.is_connected() {
            return Ok(self.stop(StopReason::SensorDisconnected));
        }

        let mut step_m = 0.0;
        let outcome = match self.registry.read(driving).await {
            Ok(frame_id) => {
                let (outcome, step) = self.fuse_latest(frame_id)?;
                step_m = step;
                outcome
            }
            Err(RegistryError::SensorDisconnected { .. }) => {
                return Ok(self.stop(StopReason::SensorDisconnected));
            }
            Err(e @ (RegistryError::Contract(_) | RegistryError::NotReady { .. })) => {
                return Err(e.into());
            }
            Err(e) => {
                warn!(error = %e, "cycle skipped");
                CycleOutcome::Skipped { reason: e.kind() }
            }
        };

        let evictions = self
            .scheduler
            .tick(Instant::now(), self.registry.store_mut());
        let evicted = evictions.iter().filter(|e| e.frame_id.is_some()).count();

        self.finish_cycle(&outcome, cycle_started.elapsed(), evicted, step_m);

        if self
            .config
            .max_cycles
            .is_some_and(|max| self.stats.cycles >= max)
        {
            info!(cycles = self.stats.cycles, "cycle limit reached");
            self.stop(StopReason::MaxCycles);
        }

        Ok(outcome)
    }

    /// Start if needed, then run cycles until a stop condition fires.
    ///
    /// Cycles are paced by `min_cycle_period` when configured.
    #[instrument(name = "pipeline_run", skip(self))]
    pub async fn run(&mut self) -> Result<PipelineStats> {
        if self.state == PipelineState::Starting {
            self.start()?;
        }

        while self.state == PipelineState::Running {
            let cycle_started = Instant::now();
            self.run_cycle().await?;

            if let (PipelineState::Running, Some(period)) =
                (self.state, self.config.min_cycle_period)
            {
                tokio::time::sleep_until(cycle_started + period).await;
            }
        }

        let stats = self.stats();
        info!(
            cycles = stats.cycles,
            committed = stats.committed,
            skipped = stats.skipped,
            map_points = stats.map_points,
            stop_reason = ?stats.stop_reason,
            "pipeline finished"
        );
        Ok(stats)
    }

    /// Stop at the current cycle boundary; no-op unless `Running`
    pub fn request_stop(&mut self) -> Option<StopReason> {
        if self.state != PipelineState::Running {
            return None;
        }
        self.stop(StopReason::StopRequested);
        Some(StopReason::StopRequested)
    }

    /// Derive, compose and commit from the two newest driving readings.
    /// Returns the outcome and the distance the pose moved.
    fn fuse_latest(&mut self, frame_id: FrameId) -> Result<(CycleOutcome, f64)> {
        let driving = self.config.driving_sensor;
        let Some((previous, current)) = self.registry.store().latest_pair(driving)? else {
            debug!(frame_id, "first reading, nothing to compare");
            return Ok((CycleOutcome::NoOp { frame_id }, 0.0));
        };

        let Some(change) = self.estimator.estimate(previous, current) else {
            debug!(frame_id, "no pose change derivable");
            return Ok((CycleOutcome::NoOp { frame_id }, 0.0));
        };

        let cloud = current.stereo().map(|m| Arc::clone(&m.point_cloud));
        let old_pose = self.publisher.borrow().pose;
        let new_pose = fusion::compose(&old_pose, &change, self.config.composition);
        let world = cloud
            .map(|points| fusion::to_world(&points, &new_pose))
            .unwrap_or_default();
        let points = world.len();
        let step_m = (new_pose.translation() - old_pose.translation()).norm();

        let policy = self.config.map_policy;
        self.publisher.send_modify(|snapshot| {
            snapshot.pose = new_pose;
            fusion::fold_into(Arc::make_mut(&mut snapshot.map), world, policy);
            snapshot.last_frame_id = Some(frame_id);
        });

        debug!(frame_id, points, step_m, "pose committed");
        Ok((CycleOutcome::Committed { frame_id, points }, step_m))
    }

    fn finish_cycle(
        &mut self,
        outcome: &CycleOutcome,
        duration: std::time::Duration,
        evicted: usize,
        step_m: f64,
    ) {
        let stats = &mut self.stats;
        stats.cycles += 1;
        stats.evictions += evicted as u64;
        stats.cycle_metrics.record_evictions(evicted);

        match outcome {
            CycleOutcome::Committed { .. } => {
                stats.committed += 1;
                stats.distance_m += step_m;
                stats.cycle_metrics.record_committed(duration, step_m);
                record_cycle(CycleKind::Committed, duration);
            }
            CycleOutcome::NoOp { .. } => {
                stats.no_op += 1;
                stats.cycle_metrics.record_no_op(duration);
                record_cycle(CycleKind::NoOp, duration);
            }
            CycleOutcome::Skipped { reason } => {
                stats.skipped += 1;
                stats.cycle_metrics.record_skipped(duration, *reason);
                record_cycle(CycleKind::Skipped, duration);
                record_skip(reason);
            }
            CycleOutcome::Stopped(_) => {}
        }

        let cycles = stats.cycles;
        self.publisher.send_modify(|s| s.cycle = cycles);

        let snapshot = self.publisher.borrow();
        record_pose(&snapshot.pose, snapshot.map.len());
    }

    /// Release every sensor and end in `Stopped`
    fn stop(&mut self, reason: StopReason) -> CycleOutcome {
        self.transition(PipelineState::Stopping);
        info!(reason = %reason, "pipeline stopping");

        self.registry.shutdown_all();
        self.stats.stop_reason = Some(reason);
        self.stats.duration = self.started_at.map(|t| t.elapsed()).unwrap_or_default();

        self.transition(PipelineState::Stopped);
        CycleOutcome::Stopped(reason)
    }

    fn transition(&mut self, state: PipelineState) {
        debug!(from = %self.state, to = %state, "pipeline state transition");
        self.state = state;
        self.publisher.send_modify(|s| s.state = state);
        record_state(state.as_str());
    }

    fn expect_state(&self, expected: PipelineState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(PipelineError::InvalidState {
                state: self.state,
                expected,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use contracts::{
        AcquireError, ContractError, ImageSize, InitError, MapPolicy, PoseChange,
        ReadingRegistrar, SensorPayload, SensorReading, SensorType, StereoMeasurement,
    };
    use ingestion::{MockSensorControl, MockSensorHandle};
    use nalgebra::{Point3, Vector3};

    use crate::stop::StopFlag;

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn stereo(dx: f64, points: Vec<Point3<f64>>) -> SensorPayload {
        SensorPayload::Stereo(StereoMeasurement::new(
            points,
            PoseChange::from_translation(Vector3::new(dx, 0.0, 0.0)),
            ImageSize::default(),
        ))
    }

    fn pipeline(
        control: &MockSensorControl,
        config: PipelineConfig,
    ) -> ProcessingPipeline<MockSensorHandle> {
        let mut registry = SensorRegistry::new();
        registry
            .register(
                MockSensorHandle::new(SensorType::StereoCamera, control.clone()),
                TIMEOUT,
            )
            .unwrap();
        ProcessingPipeline::new(registry, config)
    }

    fn started(control: &MockSensorControl) -> ProcessingPipeline<MockSensorHandle> {
        let mut pipeline = pipeline(control, PipelineConfig::default());
        pipeline.start().unwrap();
        pipeline
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_enters_running() {
        let control = MockSensorControl::new();
        let pipeline = started(&control);

        assert_eq!(pipeline.state(), PipelineState::Running);
        assert_eq!(control.init_calls(), 1);
        assert!(pipeline
            .scheduler()
            .clear_interval(SensorType::StereoCamera)
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_fails_when_driving_sensor_fails() {
        let control = MockSensorControl::new();
        control.fail_init(InitError::calibration("bad baseline"));
        let mut pipeline = pipeline(&control, PipelineConfig::default());

        let err = pipeline.start().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InitializationFailed {
                sensor_type: SensorType::StereoCamera,
                source: Some(InitError::Calibration { .. }),
                ..
            }
        ));
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert_eq!(
            pipeline.stats().stop_reason,
            Some(StopReason::InitializationFailed)
        );
        assert!(matches!(
            pipeline.run_cycle().await,
            Err(PipelineError::InvalidState { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_fails_without_driving_handle() {
        let control = MockSensorControl::new();
        let config = PipelineConfig {
            driving_sensor: SensorType::Imu,
            ..PipelineConfig::default()
        };
        let mut pipeline = pipeline(&control, config);

        assert!(matches!(
            pipeline.start(),
            Err(PipelineError::InitializationFailed {
                sensor_type: SensorType::Imu,
                ..
            })
        ));
        assert_eq!(control.shutdown_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_fails_when_disconnected() {
        let control = MockSensorControl::new();
        control.set_connected(false);
        let mut pipeline = pipeline(&control, PipelineConfig::default());

        assert!(pipeline.start().is_err());
        assert_eq!(pipeline.state(), PipelineState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_reading_is_noop() {
        let control = MockSensorControl::new();
        control.push_payload(stereo(0.0, vec![Point3::new(1.0, 0.0, 0.0)]));
        let mut pipeline = started(&control);

        let outcome = pipeline.run_cycle().await.unwrap();
        assert_eq!(outcome, CycleOutcome::NoOp { frame_id: 0 });
        assert_eq!(pipeline.pose(), Pose::identity());
        assert!(pipeline.map().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_committed_cycle_updates_pose_and_map() {
        let control = MockSensorControl::new();
        control.push_payload(stereo(0.0, vec![]));
        control.push_payload(stereo(1.0, vec![Point3::new(1.0, 0.0, 0.0)]));
        let mut pipeline = started(&control);
        let observer = pipeline.observer();

        pipeline.run_cycle().await.unwrap();
        let outcome = pipeline.run_cycle().await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Committed {
                frame_id: 1,
                points: 1
            }
        );
        let snapshot = observer.snapshot();
        assert_eq!(*snapshot.pose.translation(), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(snapshot.map.points(), &[Point3::new(2.0, 0.0, 0.0)]);
        assert_eq!(snapshot.last_frame_id, Some(1));
        assert_eq!(snapshot.cycle, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_change_leaves_pose_and_map() {
        let control = MockSensorControl::new();
        control.push_payload(stereo(1.0, vec![Point3::origin()]));
        control.push_payload(stereo(1.0, vec![Point3::origin()]));
        let mut pipeline = started(&control)
            .with_estimator(|_: &SensorReading, _: &SensorReading| None::<PoseChange>);

        pipeline.run_cycle().await.unwrap();
        let outcome = pipeline.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::NoOp { frame_id: 1 });
        assert_eq!(pipeline.pose(), Pose::identity());
        assert!(pipeline.map().is_empty());
        assert_eq!(pipeline.stats().no_op, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_policy_keeps_latest_cloud() {
        let control = MockSensorControl::new();
        control.push_payload(stereo(0.0, vec![]));
        control.push_payload(stereo(1.0, vec![Point3::origin(), Point3::origin()]));
        control.push_payload(stereo(1.0, vec![Point3::origin()]));
        let config = PipelineConfig {
            map_policy: MapPolicy::Replace,
            ..PipelineConfig::default()
        };
        let mut pipeline = pipeline(&control, config);
        pipeline.start().unwrap();

        for _ in 0..3 {
            pipeline.run_cycle().await.unwrap();
        }
        assert_eq!(pipeline.map().points(), &[Point3::new(2.0, 0.0, 0.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_stops_without_acquiring() {
        let control = MockSensorControl::new();
        let mut pipeline = started(&control);
        control.set_connected(false);

        let outcome = pipeline.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Stopped(StopReason::SensorDisconnected));
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert_eq!(control.acquire_calls(), 0);
        assert_eq!(control.shutdown_calls(), 1);
        assert_eq!(pipeline.pose(), Pose::identity());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_skips_cycle_but_still_evicts() {
        let control = MockSensorControl::new();
        control.push_payload(stereo(0.0, vec![]));
        let config = PipelineConfig::default()
            .with_clear_interval(SensorType::StereoCamera, Duration::from_millis(50));
        let mut pipeline = pipeline(&control, config);
        pipeline.start().unwrap();

        pipeline.run_cycle().await.unwrap();
        assert_eq!(
            pipeline.registry().store().len(SensorType::StereoCamera).unwrap(),
            1
        );

        control.set_acquire_delay(Duration::from_millis(200));
        let outcome = pipeline.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Skipped { reason: "timeout" });
        assert_eq!(pipeline.state(), PipelineState::Running);
        assert_eq!(pipeline.pose(), Pose::identity());
        assert!(pipeline
            .registry()
            .store()
            .is_empty(SensorType::StereoCamera)
            .unwrap());

        let stats = pipeline.stats();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.reads.timed_out, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_failure_skips_cycle() {
        let control = MockSensorControl::new();
        control.push_failure(AcquireError::grab("dropped frame"));
        let mut pipeline = started(&control);

        let outcome = pipeline.run_cycle().await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Skipped {
                reason: "acquire_failed"
            }
        );
        assert_eq!(pipeline.state(), PipelineState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_signal_checked_at_cycle_start() {
        let control = MockSensorControl::new();
        let flag = StopFlag::new();
        let mut pipeline = started(&control).with_stop_signal(flag.clone());

        pipeline.run_cycle().await.unwrap();
        flag.request();
        let outcome = pipeline.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Stopped(StopReason::StopRequested));
        assert_eq!(control.acquire_calls(), 1);
        assert_eq!(pipeline.state(), PipelineState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_max_cycles() {
        let control = MockSensorControl::new();
        for dx in [0.0, 1.0, 1.0, 1.0] {
            control.push_payload(stereo(dx, vec![Point3::origin()]));
        }
        let config = PipelineConfig::default().with_max_cycles(4);
        let mut pipeline = pipeline(&control, config);
        let mut observer = pipeline.observer();

        let stats = pipeline.run().await.unwrap();

        assert_eq!(stats.cycles, 4);
        assert_eq!(stats.committed, 3);
        assert_eq!(stats.stop_reason, Some(StopReason::MaxCycles));
        assert!((stats.distance_m - 3.0).abs() < 1e-9);
        assert_eq!(stats.map_points, 3);

        let snapshot = observer.stopped().await;
        assert_eq!(snapshot.state, PipelineState::Stopped);
        assert_eq!(*snapshot.pose.translation(), Vector3::new(3.0, 0.0, 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_cycle_period_paces_run() {
        let control = MockSensorControl::new();
        let config = PipelineConfig {
            min_cycle_period: Some(Duration::from_millis(100)),
            ..PipelineConfig::default().with_max_cycles(3)
        };
        let mut pipeline = pipeline(&control, config);

        let started = Instant::now();
        pipeline.run().await.unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300));
    }

    /// Initializes fine but never registers its reading type
    struct UnregisteredHandle {
        shutdowns: Arc<AtomicUsize>,
    }

    impl SensorHandle for UnregisteredHandle {
        fn sensor_type(&self) -> SensorType {
            SensorType::StereoCamera
        }

        fn initialize(
            &mut self,
            _registrar: &mut dyn ReadingRegistrar,
        ) -> std::result::Result<(), InitError> {
            Ok(())
        }

        async fn acquire(&mut self) -> std::result::Result<SensorPayload, AcquireError> {
            Ok(stereo(0.0, vec![]))
        }

        fn check_connection(&self) -> bool {
            true
        }

        fn shutdown(&mut self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_error_stops_and_releases_sensors() {
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let mut registry = SensorRegistry::new();
        registry
            .register(
                UnregisteredHandle {
                    shutdowns: Arc::clone(&shutdowns),
                },
                TIMEOUT,
            )
            .unwrap();
        let mut pipeline = ProcessingPipeline::new(registry, PipelineConfig::default());
        let mut observer = pipeline.observer();

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Registry(RegistryError::Contract(
                ContractError::UnknownSensorType { .. }
            ))
        ));
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert_eq!(pipeline.stats().stop_reason, Some(StopReason::Fault));
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);

        let snapshot = observer.stopped().await;
        assert_eq!(snapshot.state, PipelineState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_stop() {
        let control = MockSensorControl::new();
        let mut pipeline = started(&control);

        assert_eq!(pipeline.request_stop(), Some(StopReason::StopRequested));
        assert_eq!(pipeline.request_stop(), None);
        assert_eq!(pipeline.state(), PipelineState::Stopped);
    }
}
