//! Configuration text to final pose, over the synthetic and replay rigs.

use std::io::Write;

use config_loader::{ConfigFormat, ConfigLoader};
use odometry::{PipelineState, SentinelFile, StopReason};

use crate::support::*;

fn synthetic_config(pipeline: &str, rig: &str) -> String {
    format!(
        r#"
[pipeline]
{pipeline}

[[sensors]]
sensor_type = "stereo_camera"
acquire_timeout_ms = 500

[sensors.rig]
kind = "synthetic"
frequency_hz = 10.0
points_per_frame = 16
{rig}
"#
    )
}

#[tokio::test(start_paused = true)]
async fn test_synthetic_run_from_config_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(synthetic_config("max_cycles = 11", "speed_mps = 2.0").as_bytes())
        .unwrap();

    let blueprint = ConfigLoader::load_from_path(file.path()).unwrap();
    let mut pipeline = rig_pipeline(&blueprint);
    let stats = pipeline.run().await.unwrap();

    assert_eq!(stats.stop_reason, Some(StopReason::MaxCycles));
    assert_eq!(stats.cycles, 11);
    assert_eq!(stats.committed, 10);
    assert_eq!(stats.no_op, 1);
    assert_close(stats.final_pose.translation().x, 2.0);
    assert_close(stats.distance_m, 2.0);
    assert!(stats.map_points > 0);
    assert_eq!(stats.map_points, pipeline.map().len());
    assert_eq!(
        pipeline.registry().store().len(STEREO).unwrap(),
        11,
        "default clear interval outlasts the run"
    );
}

#[tokio::test(start_paused = true)]
async fn test_composition_conventions_diverge_under_yaw() {
    let rig = "speed_mps = 1.0\nyaw_rate_dps = 90.0";

    let body = ConfigLoader::load_from_str(
        &synthetic_config("max_cycles = 6\ncomposition = \"body_frame\"", rig),
        ConfigFormat::Toml,
    )
    .unwrap();
    let world = ConfigLoader::load_from_str(
        &synthetic_config("max_cycles = 6\ncomposition = \"world_frame\"", rig),
        ConfigFormat::Toml,
    )
    .unwrap();

    let body_stats = rig_pipeline(&body).run().await.unwrap();
    let world_stats = rig_pipeline(&world).run().await.unwrap();

    // same rotation either way, 9 degrees per committed frame
    let expected_yaw = (5.0 * 9.0f64).to_radians();
    for stats in [&body_stats, &world_stats] {
        let r = stats.final_pose.rotation();
        assert!((r[(1, 0)].atan2(r[(0, 0)]) - expected_yaw).abs() < 1e-9);
    }

    let body_t = body_stats.final_pose.translation();
    let world_t = world_stats.final_pose.translation();
    assert!(body_t.y > 0.1, "body frame should curve left, got {body_t:?}");
    assert_eq!(world_t.y, 0.0);
    assert_close(world_t.x, 0.5);
}

#[tokio::test(start_paused = true)]
async fn test_replace_policy_keeps_latest_cloud() {
    let blueprint = ConfigLoader::load_from_str(
        &synthetic_config("max_cycles = 5\nmap_policy = \"replace\"", ""),
        ConfigFormat::Toml,
    )
    .unwrap();

    let stats = rig_pipeline(&blueprint).run().await.unwrap();

    assert_eq!(stats.committed, 4);
    assert!(stats.map_points > 0);
    assert!(stats.map_points <= 16);
}

#[tokio::test(start_paused = true)]
async fn test_replay_runs_until_recording_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let recording = dir.path().join("drive.jsonl");
    let step = r#""delta_translation":[0.5,0.0,0.0],"points":[[1.0,0.0,0.0],[2.0,0.0,0.0]]"#;
    let lines = [
        format!(r#"{{"timestamp":0.0,{step}}}"#),
        format!(r#"{{"timestamp":0.1,{step}}}"#),
        r#"{"timestamp":0.15,"error":"disparity search failed"}"#.to_string(),
        String::new(),
        format!(r#"{{"timestamp":0.2,{step}}}"#),
        format!(r#"{{"timestamp":0.3,{step}}}"#),
    ];
    std::fs::write(&recording, lines.join("\n")).unwrap();

    let toml = format!(
        r#"
[[sensors]]
sensor_type = "stereo_camera"

[sensors.rig]
kind = "replay"
path = "{}"
"#,
        recording.display()
    );
    let blueprint = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
    let mut pipeline = rig_pipeline(&blueprint);
    let stats = pipeline.run().await.unwrap();

    assert_eq!(stats.stop_reason, Some(StopReason::SensorDisconnected));
    assert_eq!(stats.cycles, 5);
    assert_eq!(stats.no_op, 1);
    assert_eq!(stats.committed, 3);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.reads.failed, 1);
    assert_close(stats.final_pose.translation().x, 1.5);
    assert_eq!(stats.map_points, 6);
    assert_eq!(pipeline.state(), PipelineState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_sentinel_file_stops_run() {
    let dir = tempfile::tempdir().unwrap();
    let sentinel = dir.path().join("stop");

    let blueprint = ConfigLoader::load_from_str(
        &synthetic_config("max_cycles = 100", ""),
        ConfigFormat::Toml,
    )
    .unwrap();
    let mut pipeline = rig_pipeline(&blueprint).with_stop_signal(SentinelFile::new(&sentinel));
    let mut observer = pipeline.observer();

    let writer = tokio::spawn(async move {
        while let Some(snapshot) = observer.changed().await {
            if snapshot.cycle >= 3 {
                std::fs::write(&sentinel, b"").unwrap();
                return;
            }
            if snapshot.state == PipelineState::Stopped {
                return;
            }
        }
    });

    let stats = pipeline.run().await.unwrap();
    writer.await.unwrap();

    assert_eq!(stats.stop_reason, Some(StopReason::StopRequested));
    assert!(stats.cycles >= 3 && stats.cycles < 100, "cycles = {}", stats.cycles);
    assert_eq!(pipeline.state(), PipelineState::Stopped);
}
