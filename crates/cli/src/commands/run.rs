//! `run` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{OdometryBlueprint, ReplayRigConfig, RigConfig};
use odometry::{PipelineError, PipelineObserver, PipelineState, StopFlag};
use tracing::{debug, info, warn};

use super::load_config;
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{build_pipeline, RunSummary};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "loading configuration");

    let mut blueprint = load_config(&args.config)?;
    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .map_err(|e| CliError::config_invalid(&args.config, e))?;

    info!(
        driving_sensor = %blueprint.pipeline.driving_sensor,
        sensors = blueprint.sensors.len(),
        max_cycles = blueprint.pipeline.max_cycles,
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let stop_flag = StopFlag::new();
    let mut pipeline = build_pipeline(&blueprint, stop_flag.clone())?;

    let signal_flag = stop_flag.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("received shutdown signal, stopping at the next cycle boundary");
        signal_flag.request();
    });

    if args.timeout > 0 {
        let timeout = Duration::from_secs(args.timeout);
        let deadline_flag = stop_flag.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            info!(timeout_secs = timeout.as_secs(), "run timeout reached");
            deadline_flag.request();
        });
    }

    tokio::spawn(log_progress(pipeline.observer()));

    info!("starting pipeline");
    let stats = match pipeline.run().await {
        Ok(stats) => stats,
        Err(e @ PipelineError::InitializationFailed { .. }) => {
            return Err(CliError::Startup(e).into());
        }
        Err(e) => return Err(e).context("pipeline execution failed"),
    };

    info!(
        cycles = stats.cycles,
        committed = stats.committed,
        duration_secs = stats.duration.as_secs_f64(),
        cycles_per_sec = format!("{:.2}", stats.cycles_per_sec()),
        "pipeline completed"
    );

    let summary = RunSummary::from(&stats);
    if args.json {
        let json =
            serde_json::to_string_pretty(&summary).context("failed to serialize run summary")?;
        println!("{json}");
    } else {
        summary.print();
    }

    Ok(())
}

/// Fold command-line overrides into the loaded configuration
fn apply_overrides(blueprint: &mut OdometryBlueprint, args: &RunArgs) {
    if let Some(max_cycles) = args.max_cycles {
        info!(max_cycles, "overriding max_cycles from CLI");
        blueprint.pipeline.max_cycles = max_cycles;
    }

    if let Some(path) = &args.stop_file {
        info!(path = %path.display(), "overriding stop sentinel file from CLI");
        blueprint.stop.sentinel_file = Some(path.clone());
    }

    if let Some(path) = &args.replay {
        let driving = blueprint.pipeline.driving_sensor;
        match blueprint
            .sensors
            .iter_mut()
            .find(|s| s.sensor_type == driving)
        {
            Some(sensor) => {
                info!(path = %path.display(), sensor_type = %driving, "replaying recording");
                sensor.rig = RigConfig::Replay(ReplayRigConfig {
                    path: path.clone(),
                    speed_multiplier: args.replay_speed,
                    loop_playback: args.replay_loop,
                });
            }
            None => warn!(sensor_type = %driving, "driving sensor not configured, --replay ignored"),
        }
    }
}

/// Log each published snapshot until the pipeline stops
async fn log_progress(mut observer: PipelineObserver) {
    while let Some(snapshot) = observer.changed().await {
        let t = snapshot.pose.translation();
        debug!(
            cycle = snapshot.cycle,
            state = %snapshot.state,
            x = t.x,
            y = t.y,
            z = t.z,
            map_points = snapshot.map.len(),
            "pipeline progress"
        );
        if snapshot.state == PipelineState::Stopped {
            break;
        }
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &OdometryBlueprint) {
    let pipeline = &blueprint.pipeline;

    println!("\n=== Configuration Summary ===\n");
    println!("Pipeline:");
    println!("  Driving sensor: {}", pipeline.driving_sensor);
    println!("  Composition: {:?}", pipeline.composition);
    println!("  Map policy: {:?}", pipeline.map_policy);
    match pipeline.max_cycles() {
        Some(max) => println!("  Max cycles: {max}"),
        None => println!("  Max cycles: unlimited"),
    }
    if let Some(period) = pipeline.min_cycle_period() {
        println!("  Min cycle period: {}ms", period.as_millis());
    }
    if let Some(path) = &blueprint.stop.sentinel_file {
        println!("  Stop file: {}", path.display());
    }

    println!("\nSensors ({}):", blueprint.sensors.len());
    for sensor in &blueprint.sensors {
        let rig = match &sensor.rig {
            RigConfig::Synthetic(s) => format!("synthetic @ {} Hz", s.frequency_hz),
            RigConfig::Replay(r) => format!("replay {}", r.path.display()),
        };
        println!(
            "  - {} ({rig}) clear every {}ms, timeout {}ms",
            sensor.sensor_type, sensor.clear_interval_ms, sensor.acquire_timeout_ms
        );
    }

    println!();
}
