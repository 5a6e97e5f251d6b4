//! Physics type re-exports from glam
//!
//! This module provides the core mathematical types used throughout
//! the physics system, re-exported from the glam library, plus the
//! small numeric guards shared by the geometry routines.

pub use glam::{EulerRot, Mat3, Quat, Vec3};

/// Axes shorter than this are treated as degenerate (parallel edges in SAT,
/// coincident centers in sphere tests).
pub const AXIS_EPSILON: f32 = 1e-4;

/// Normalizes `v`, or returns `None` when it is too short to carry a direction.
pub fn try_normalize(v: Vec3) -> Option<Vec3> {
    let len = v.length();
    if len < AXIS_EPSILON || !len.is_finite() {
        None
    } else {
        Some(v / len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_normalize_rejects_short_vectors() {
        assert!(try_normalize(Vec3::splat(1e-6)).is_none());
        let n = try_normalize(Vec3::new(0.0, 3.0, 4.0)).unwrap();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }
}
