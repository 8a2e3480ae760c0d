//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Normalize `v`, falling back to `fallback` for (near) zero-length vectors.
pub fn normalize_or(v: Vector3f, fallback: Vector3f) -> Vector3f {
    v.try_normalize(f32::EPSILON).unwrap_or(fallback)
}
