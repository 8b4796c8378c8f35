//! # Odometry
//!
//! Processing pipeline: capture → pose change → pose/map fusion → eviction,
//! repeated until a stop condition fires.
//!
//! ## State machine
//!
//! ```text
//! Starting ──init ok──▶ Running ──stop signal / disconnect / max cycles──▶ Stopping ──▶ Stopped
//!     └──────init failed (InitializationFailed)──────────────────────────────────────────▲
//! ```
//!
//! Exactly one cycle runs at a time. Pose and map are published as one
//! immutable snapshot at the end of each cycle; observers never see a
//! partially applied cycle.
//!
//! ## Usage Example
//!
//! ```ignore
//! use odometry::{PipelineConfig, ProcessingPipeline, StopFlag};
//!
//! let stop = StopFlag::new();
//! let mut pipeline = ProcessingPipeline::new(registry, PipelineConfig::from_blueprint(&blueprint))
//!     .with_stop_signal(stop.clone());
//! let observer = pipeline.observer();
//!
//! let stats = pipeline.run().await?;
//! println!("{:?}", observer.pose());
//! ```

mod config;
mod error;
mod estimator;
pub mod fusion;
mod observer;
mod pipeline;
mod state;
mod stats;
mod stop;

pub use config::{PipelineConfig, DEFAULT_CLEAR_INTERVAL};
pub use error::{PipelineError, Result};
pub use estimator::{OdometryDeltaEstimator, PoseChangeEstimator};
pub use observer::{PipelineObserver, PipelineSnapshot};
pub use pipeline::ProcessingPipeline;
pub use state::{CycleOutcome, PipelineState, StopReason};
pub use stats::PipelineStats;
pub use stop::{AnyStop, NeverStop, SentinelFile, StopFlag};
