//! Ordering, bounds and idempotence properties across crates.

use std::time::Duration;

use contracts::{ContractError, InitError, Instant, SensorHandle, SensorStatus, SensorType};
use ingestion::{MockSensorControl, MockSensorHandle, RegistryError, SensorRegistry};
use nalgebra::Point3;
use odometry::{PipelineConfig, PipelineState, StopReason};
use sensor_store::{EvictionScheduler, LiveSensorStore};

use crate::support::*;

#[tokio::test(start_paused = true)]
async fn test_frame_ids_stay_ordered_across_captures_and_evictions() {
    let mut store = LiveSensorStore::new();
    let mut handle = MockSensorHandle::new(STEREO, MockSensorControl::new());
    handle.initialize(&mut store).unwrap();

    for i in 0..30u64 {
        let frame_id = store.capture_from(&mut handle).await.unwrap();
        assert_eq!(frame_id, i);

        if i % 3 == 2 {
            store.evict_oldest(STEREO).unwrap();
        }
        tokio::time::advance(Duration::from_millis(7)).await;

        let ids = store.frame_ids(STEREO).unwrap();
        let stamps = store.timestamps(STEREO).unwrap();
        assert_eq!(ids.len(), stamps.len());
        assert_eq!(ids.len(), store.all(STEREO).unwrap().count());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    assert_eq!(store.next_frame_id(STEREO).unwrap(), 30);
    assert_eq!(store.len(STEREO).unwrap(), 20);
}

#[test]
fn test_stalled_eviction_catches_up_one_slot_per_tick() {
    let t0 = Instant::now();
    let mut store = LiveSensorStore::new();
    store.register(STEREO);
    for i in 0..10u64 {
        store.append(STEREO, reading(i, t0, stereo(0.0, &[]))).unwrap();
    }

    let mut scheduler = EvictionScheduler::new();
    scheduler.schedule(STEREO, Duration::from_secs(1), t0).unwrap();

    let mut total = 0;
    for ms in [3_500, 3_600, 3_700, 3_800] {
        total += scheduler
            .tick(t0 + Duration::from_millis(ms), &mut store)
            .len();
    }

    assert_eq!(total, 3);
    assert_eq!(store.frame_ids(STEREO).unwrap(), (3..10).collect::<Vec<_>>());
}

#[test]
fn test_out_of_order_appends_are_rejected() {
    let t0 = Instant::now();
    let mut store = LiveSensorStore::new();
    store.register(STEREO);
    store
        .append(STEREO, reading(3, t0 + Duration::from_secs(1), stereo(0.0, &[])))
        .unwrap();

    let stale_id = store.append(STEREO, reading(2, t0 + Duration::from_secs(2), stereo(0.0, &[])));
    assert!(matches!(stale_id, Err(ContractError::OutOfOrder { .. })));

    let stale_time = store.append(STEREO, reading(4, t0, stereo(0.0, &[])));
    assert!(matches!(stale_time, Err(ContractError::OutOfOrder { .. })));

    assert_eq!(store.frame_ids(STEREO).unwrap(), vec![3]);
    assert_eq!(store.next_frame_id(STEREO).unwrap(), 4);
    assert!(matches!(
        store.len(SensorType::Imu),
        Err(ContractError::UnknownSensorType { .. })
    ));
}

#[test]
fn test_eviction_on_empty_sequence_still_advances() {
    let t0 = Instant::now();
    let mut store = LiveSensorStore::new();
    store.register(STEREO);
    assert!(store.evict_oldest(STEREO).unwrap().is_none());

    let mut scheduler = EvictionScheduler::new();
    scheduler
        .schedule(STEREO, Duration::from_secs(1), t0)
        .unwrap();

    let fired = scheduler.tick(t0 + Duration::from_secs(1), &mut store);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].frame_id, None);
    assert_eq!(
        scheduler.next_clear_time(STEREO).unwrap(),
        t0 + Duration::from_secs(2)
    );
}

#[test]
fn test_eviction_count_bounded_by_elapsed_intervals() {
    let interval = Duration::from_secs(1);
    let patterns: [&[u64]; 5] = [
        &[300],
        &[1_000],
        &[1_700],
        &[5_000, 10, 10, 990],
        &[12_000, 1, 999, 2_500, 400],
    ];

    for steps in patterns {
        let t0 = Instant::now();
        let mut store = LiveSensorStore::new();
        store.register(STEREO);
        for i in 0..200u64 {
            store
                .append(STEREO, reading(i, t0 + Duration::from_millis(i), stereo(0.0, &[])))
                .unwrap();
        }

        let mut scheduler = EvictionScheduler::new();
        scheduler.schedule(STEREO, interval, t0).unwrap();

        let mut now = t0;
        let mut evictions = 0u128;
        for _ in 0..10 {
            for step in steps {
                now += Duration::from_millis(*step);
                let fired = scheduler.tick(now, &mut store).len();
                assert!(fired <= 1);
                evictions += fired as u128;

                let elapsed = (now - t0).as_nanos();
                assert!(
                    evictions <= elapsed / interval.as_nanos(),
                    "{evictions} evictions after {elapsed}ns with steps {steps:?}"
                );

                // every elapsed slot is either evicted or still owed
                let next = scheduler.next_clear_time(STEREO).unwrap();
                assert_eq!((next - t0).as_nanos() % interval.as_nanos(), 0);
                assert_eq!((next - t0).as_nanos() / interval.as_nanos(), evictions + 1);
            }
        }
        assert_eq!(store.len(STEREO).unwrap() as u128, 200 - evictions);
    }
}

#[tokio::test]
async fn test_shutdown_releases_handle_once() {
    let control = MockSensorControl::new();
    let mut registry = mock_registry(&control);
    assert!(registry.initialize_all()[&STEREO].is_ok());

    registry.shutdown_all();
    registry.shutdown_all();
    registry.shutdown(STEREO).unwrap();

    assert_eq!(control.shutdown_calls(), 1);
    assert_eq!(registry.status(STEREO).unwrap(), SensorStatus::ShutDown);
    assert!(matches!(
        registry.read(STEREO).await,
        Err(RegistryError::NotReady { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_stop_is_idempotent() {
    let control = MockSensorControl::new();
    let mut pipeline = mock_pipeline(&control, PipelineConfig::default());
    pipeline.start().unwrap();

    assert_eq!(pipeline.request_stop(), Some(StopReason::StopRequested));
    assert_eq!(pipeline.request_stop(), None);
    assert_eq!(pipeline.state(), PipelineState::Stopped);
    assert_eq!(control.shutdown_calls(), 1);
}

#[test]
fn test_status_is_cached_until_probed() {
    let control = MockSensorControl::new();
    let mut registry = mock_registry(&control);
    registry.initialize(STEREO).unwrap();

    control.set_connected(false);
    assert_eq!(registry.status(STEREO).unwrap(), SensorStatus::Connected);

    assert!(!registry.check_connection(STEREO).unwrap());
    assert_eq!(registry.status(STEREO).unwrap(), SensorStatus::Disconnected);

    control.set_connected(true);
    assert!(registry.check_connection(STEREO).unwrap());
    assert_eq!(registry.status(STEREO).unwrap(), SensorStatus::Connected);
}

#[test]
fn test_one_failed_sensor_does_not_block_others() {
    let stereo_control = MockSensorControl::new();
    let imu_control = MockSensorControl::new();
    imu_control.fail_init(InitError::device("imu bus error"));

    let mut registry = SensorRegistry::new();
    registry
        .register(MockSensorHandle::new(STEREO, stereo_control.clone()), TIMEOUT)
        .unwrap();
    registry
        .register(MockSensorHandle::new(SensorType::Imu, imu_control.clone()), TIMEOUT)
        .unwrap();

    let results = registry.initialize_all();
    assert!(results[&STEREO].is_ok());
    assert!(results[&SensorType::Imu].is_err());
    assert_eq!(registry.status(STEREO).unwrap(), SensorStatus::Connected);
    assert_eq!(registry.status(SensorType::Imu).unwrap(), SensorStatus::Failed);
    assert!(registry.store().contains(STEREO));
    assert!(!registry.store().contains(SensorType::Imu));
}

#[tokio::test(start_paused = true)]
async fn test_observer_sees_pose_and_map_from_same_cycle() {
    let control = MockSensorControl::new();
    control.set_acquire_delay(Duration::from_millis(10));
    for _ in 0..6 {
        control.push_payload(stereo(1.0, &[[0.0, 0.0, 0.0]]));
    }

    let mut pipeline = mock_pipeline(&control, PipelineConfig::default().with_max_cycles(6));
    let mut observer = pipeline.observer();

    let watcher = tokio::spawn(async move {
        let mut seen = 0;
        while let Some(snapshot) = observer.changed().await {
            // one metre and one point per committed cycle
            assert_eq!(snapshot.map.len() as f64, snapshot.pose.translation().x);
            seen += 1;
            if snapshot.state == PipelineState::Stopped {
                return (seen, snapshot);
            }
        }
        panic!("pipeline dropped before stopping");
    });

    let stats = pipeline.run().await.unwrap();
    let (seen, last) = watcher.await.unwrap();

    assert!(seen >= 2);
    assert_eq!(stats.committed, 5);
    assert_eq!(last.map.len(), 5);
    assert_eq!(last.cycle, 6);
    assert_eq!(stats.stop_reason, Some(StopReason::MaxCycles));
}

#[tokio::test(start_paused = true)]
async fn test_map_snapshot_is_independent_of_later_commits() {
    let control = MockSensorControl::new();
    for _ in 0..3 {
        control.push_payload(stereo(1.0, &[[0.0, 1.0, 0.0]]));
    }

    let mut pipeline = mock_pipeline(&control, PipelineConfig::default());
    pipeline.start().unwrap();
    pipeline.run_cycle().await.unwrap();
    pipeline.run_cycle().await.unwrap();

    let held = pipeline.map();
    assert_eq!(held.len(), 1);

    let mut copy = (*held).clone();
    copy.extend([Point3::origin()]);
    assert_eq!(pipeline.map().len(), 1);

    pipeline.run_cycle().await.unwrap();
    assert_eq!(pipeline.map().len(), 2);
    assert_eq!(held.len(), 1);
    assert_eq!(held.points(), &[Point3::new(1.0, 1.0, 0.0)]);
}
