//! # Integration Tests
//!
//! Cross-crate tests for the odometry workspace.
//!
//! - `scenario_tests`: eviction cadence, fusion after a capture,
//!   disconnect and timeout handling through the full pipeline
//! - `property_tests`: store ordering, scheduler bounds, shutdown
//!   idempotence, snapshot consistency
//! - `e2e_tests`: configuration text to final pose over the synthetic
//!   and replay rigs (no hardware required)

#[cfg(test)]
mod support;

#[cfg(test)]
mod scenario_tests;

#[cfg(test)]
mod property_tests;

#[cfg(test)]
mod e2e_tests;
