//! Pose composition and map fusion
//!
//! Rotations are composed as plain matrix products and are not
//! re-orthonormalized; drift over very long runs is accepted.

use contracts::{CompositionConvention, Map, MapPolicy, Pose, PoseChange};
use nalgebra::Point3;

/// Apply `change` to `pose` under `convention`.
///
/// - `BodyFrame`: `t' = t + R·Δt`, `R' = R·ΔR`
/// - `WorldFrame`: `t' = t + Δt`, `R' = ΔR·R`
pub fn compose(pose: &Pose, change: &PoseChange, convention: CompositionConvention) -> Pose {
    let (t, r) = (pose.translation(), pose.rotation());
    let (dt, dr) = (change.delta_translation(), change.delta_rotation());

    match convention {
        CompositionConvention::BodyFrame => Pose::new(t + r * dt, r * dr),
        CompositionConvention::WorldFrame => Pose::new(t + dt, dr * r),
    }
}

/// Vehicle-frame points expressed in the world frame of `pose`
pub fn to_world(points: &[Point3<f64>], pose: &Pose) -> Vec<Point3<f64>> {
    points.iter().map(|p| pose.transform_point(p)).collect()
}

/// Fold world-frame points into `map`
pub fn fold_into(map: &mut Map, points: Vec<Point3<f64>>, policy: MapPolicy) {
    match policy {
        MapPolicy::Append => map.extend(points),
        MapPolicy::Replace => map.replace(points),
    }
}
