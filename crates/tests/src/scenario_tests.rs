//! Store, scheduler and pipeline working together.

use std::time::Duration;

use contracts::{Instant, Pose, SensorStatus};
use ingestion::MockSensorControl;
use nalgebra::{Point3, Vector3};
use odometry::{CycleOutcome, PipelineConfig, PipelineState, StopReason};
use sensor_store::{EvictionScheduler, LiveSensorStore};

use crate::support::*;

#[test]
fn test_eviction_drops_oldest_once_per_interval() {
    let t0 = Instant::now();
    let mut store = LiveSensorStore::new();
    store.register(STEREO);
    for i in 0..3u64 {
        store
            .append(STEREO, reading(i, t0 + Duration::from_secs(i), stereo(0.0, &[])))
            .unwrap();
    }

    let mut scheduler = EvictionScheduler::new();
    scheduler
        .schedule(STEREO, Duration::from_secs(5), t0)
        .unwrap();

    let now = t0 + Duration::from_secs(6);
    let fired = scheduler.tick(now, &mut store);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].frame_id, Some(0));
    assert_eq!(store.frame_ids(STEREO).unwrap(), vec![1, 2]);
    assert_eq!(
        store.timestamps(STEREO).unwrap(),
        vec![t0 + Duration::from_secs(1), t0 + Duration::from_secs(2)]
    );
    assert_eq!(
        scheduler.next_clear_time(STEREO).unwrap(),
        t0 + Duration::from_secs(10)
    );

    // same instant again: nothing due
    assert!(scheduler.tick(now, &mut store).is_empty());
    assert_eq!(store.len(STEREO).unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_capture_after_existing_reading_moves_pose() {
    let control = MockSensorControl::new();
    control.push_payload(stereo(1.0, &[[1.0, 0.0, 0.0]]));

    let mut registry = mock_registry(&control);
    let store = registry.store_mut();
    store.register(STEREO);
    store
        .append(STEREO, reading(0, Instant::now(), stereo(0.0, &[])))
        .unwrap();

    let mut pipeline = odometry::ProcessingPipeline::new(registry, PipelineConfig::default());
    pipeline.start().unwrap();

    let outcome = pipeline.run_cycle().await.unwrap();
    assert_eq!(
        outcome,
        CycleOutcome::Committed {
            frame_id: 1,
            points: 1
        }
    );
    assert_eq!(pipeline.pose().translation(), &Vector3::new(1.0, 0.0, 0.0));
    assert_eq!(pipeline.map().points(), &[Point3::new(2.0, 0.0, 0.0)]);
    assert_eq!(pipeline.registry().store().frame_ids(STEREO).unwrap(), vec![0, 1]);
    assert_eq!(pipeline.state(), PipelineState::Running);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_before_read_stops_without_acquiring() {
    let control = MockSensorControl::new();
    let mut pipeline = mock_pipeline(&control, PipelineConfig::default());
    let observer = pipeline.observer();
    pipeline.start().unwrap();

    control.set_connected(false);
    let outcome = pipeline.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Stopped(StopReason::SensorDisconnected));
    assert_eq!(pipeline.state(), PipelineState::Stopped);
    assert_eq!(observer.state(), PipelineState::Stopped);
    assert_eq!(control.acquire_calls(), 0);
    assert_eq!(control.shutdown_calls(), 1);
    assert_eq!(
        pipeline.registry().status(STEREO).unwrap(),
        SensorStatus::ShutDown
    );
    assert_eq!(pipeline.stats().stop_reason, Some(StopReason::SensorDisconnected));
    assert_eq!(pipeline.stats().reads.disconnected, 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_skips_cycle_but_eviction_continues() {
    let control = MockSensorControl::new();
    control.set_acquire_delay(TIMEOUT * 2);

    let config =
        PipelineConfig::default().with_clear_interval(STEREO, Duration::from_millis(50));
    let mut registry = mock_registry(&control);
    let store = registry.store_mut();
    store.register(STEREO);
    store
        .append(STEREO, reading(0, Instant::now(), stereo(0.0, &[[1.0, 1.0, 1.0]])))
        .unwrap();

    let mut pipeline = odometry::ProcessingPipeline::new(registry, config);
    let t0 = Instant::now();
    pipeline.start().unwrap();

    let outcome = pipeline.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Skipped { reason: "timeout" });
    assert_eq!(pipeline.state(), PipelineState::Running);
    assert_eq!(pipeline.pose(), Pose::identity());
    assert!(pipeline.map().is_empty());
    // the pre-existing reading went, nothing was appended
    assert!(pipeline.registry().store().is_empty(STEREO).unwrap());
    // two slots elapsed during the timeout, one evicted and one still owed
    assert_eq!(
        pipeline.scheduler().next_clear_time(STEREO).unwrap(),
        t0 + Duration::from_millis(100)
    );

    let stats = pipeline.stats();
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.reads.timed_out, 1);
}

#[tokio::test(start_paused = true)]
async fn test_first_reading_is_noop_and_eviction_still_ticks() {
    let control = MockSensorControl::new();
    control.set_acquire_delay(Duration::from_millis(15));
    control.push_payload(stereo(5.0, &[[1.0, 0.0, 0.0]]));

    let config =
        PipelineConfig::default().with_clear_interval(STEREO, Duration::from_millis(10));
    let mut pipeline = mock_pipeline(&control, config);
    let t0 = Instant::now();
    pipeline.start().unwrap();

    let outcome = pipeline.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::NoOp { frame_id: 0 });
    assert_eq!(pipeline.pose(), Pose::identity());
    assert!(pipeline.map().is_empty());
    assert_eq!(
        pipeline.scheduler().next_clear_time(STEREO).unwrap(),
        t0 + Duration::from_millis(20)
    );
    assert!(pipeline.registry().store().is_empty(STEREO).unwrap());
    assert_eq!(pipeline.snapshot().last_frame_id, None);
}
