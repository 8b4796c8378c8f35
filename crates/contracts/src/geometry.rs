//! Pose / PoseChange / Map - externally observable result state
//!
//! Plain value containers. Setters taking dynamically-shaped nalgebra
//! matrices only check shape; no orthonormality or range validation.

use nalgebra::{DMatrix, DVector, Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Vehicle pose in the fixed world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    translation: Vector3<f64>,
    rotation: Matrix3<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Origin, identity rotation
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: Matrix3::identity(),
        }
    }

    pub fn new(translation: Vector3<f64>, rotation: Matrix3<f64>) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    /// Set translation from a dynamically-sized vector.
    ///
    /// # Errors
    /// [`ContractError::DimensionMismatch`] unless `values` has exactly 3 entries.
    pub fn set_translation(&mut self, values: &DVector<f64>) -> Result<(), ContractError> {
        self.translation = vector3_from_dyn("pose.translation", values)?;
        Ok(())
    }

    /// Set rotation from a dynamically-shaped matrix.
    ///
    /// # Errors
    /// [`ContractError::DimensionMismatch`] unless `values` is 3×3.
    pub fn set_rotation(&mut self, values: &DMatrix<f64>) -> Result<(), ContractError> {
        self.rotation = matrix3_from_dyn("pose.rotation", values)?;
        Ok(())
    }

    /// Map a vehicle-frame point into the world frame.
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * point.coords + self.translation)
    }
}

/// Estimated incremental motion between two consecutive readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseChange {
    delta_translation: Vector3<f64>,
    delta_rotation: Matrix3<f64>,
}

impl Default for PoseChange {
    fn default() -> Self {
        Self::identity()
    }
}

impl PoseChange {
    /// No motion
    pub fn identity() -> Self {
        Self {
            delta_translation: Vector3::zeros(),
            delta_rotation: Matrix3::identity(),
        }
    }

    pub fn new(delta_translation: Vector3<f64>, delta_rotation: Matrix3<f64>) -> Self {
        Self {
            delta_translation,
            delta_rotation,
        }
    }

    /// Pure translation
    pub fn from_translation(delta_translation: Vector3<f64>) -> Self {
        Self {
            delta_translation,
            delta_rotation: Matrix3::identity(),
        }
    }

    pub fn delta_translation(&self) -> &Vector3<f64> {
        &self.delta_translation
    }

    pub fn delta_rotation(&self) -> &Matrix3<f64> {
        &self.delta_rotation
    }

    /// # Errors
    /// [`ContractError::DimensionMismatch`] unless `values` has exactly 3 entries.
    pub fn set_delta_translation(&mut self, values: &DVector<f64>) -> Result<(), ContractError> {
        self.delta_translation = vector3_from_dyn("pose_change.delta_translation", values)?;
        Ok(())
    }

    /// # Errors
    /// [`ContractError::DimensionMismatch`] unless `values` is 3×3.
    pub fn set_delta_rotation(&mut self, values: &DMatrix<f64>) -> Result<(), ContractError> {
        self.delta_rotation = matrix3_from_dyn("pose_change.delta_rotation", values)?;
        Ok(())
    }

    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.delta_translation.norm() <= epsilon
            && (self.delta_rotation - Matrix3::identity()).abs().max() <= epsilon
    }
}

/// Accumulated world-frame point cloud.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Map {
    points: Vec<Point3<f64>>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    /// Build a map from an N×3 matrix, one point per row.
    ///
    /// # Errors
    /// [`ContractError::DimensionMismatch`] if the matrix does not have 3 columns.
    pub fn from_rows(rows: &DMatrix<f64>) -> Result<Self, ContractError> {
        if rows.ncols() != 3 {
            return Err(ContractError::dimension_mismatch(
                "map.points",
                "N×3",
                format!("{}×{}", rows.nrows(), rows.ncols()),
            ));
        }
        let points = rows
            .row_iter()
            .map(|row| Point3::new(row[0], row[1], row[2]))
            .collect();
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn extend<I: IntoIterator<Item = Point3<f64>>>(&mut self, points: I) {
        self.points.extend(points);
    }

    pub fn replace(&mut self, points: Vec<Point3<f64>>) {
        self.points = points;
    }

    /// Axis-aligned bounds, `None` when empty
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.points.first()?;
        let init = (first.coords, first.coords);
        let (min, max) = self.points.iter().fold(init, |(min, max), p| {
            (min.inf(&p.coords), max.sup(&p.coords))
        });
        Some((Point3::from(min), Point3::from(max)))
    }
}

fn vector3_from_dyn(
    field: &'static str,
    values: &DVector<f64>,
) -> Result<Vector3<f64>, ContractError> {
    if values.len() != 3 {
        return Err(ContractError::dimension_mismatch(
            field,
            "3",
            values.len().to_string(),
        ));
    }
    Ok(Vector3::new(values[0], values[1], values[2]))
}

fn matrix3_from_dyn(
    field: &'static str,
    values: &DMatrix<f64>,
) -> Result<Matrix3<f64>, ContractError> {
    if values.shape() != (3, 3) {
        return Err(ContractError::dimension_mismatch(
            field,
            "3×3",
            format!("{}×{}", values.nrows(), values.ncols()),
        ));
    }
    Ok(Matrix3::from_fn(|r, c| values[(r, c)]))
}
