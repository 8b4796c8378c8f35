//! Pipeline construction and run summary.

mod builder;
mod stats;

pub use builder::{build_pipeline, build_registry, stop_signal, StereoPipeline};
pub use stats::RunSummary;
