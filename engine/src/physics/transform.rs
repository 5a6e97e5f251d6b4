//! World-space transform
//!
//! Position, Euler rotation in degrees (XYZ order) and scale. The orientation
//! quaternion is derived lazily from the Euler angles and cached; every
//! mutation of the angles goes through a setter that marks the cache dirty,
//! so the two representations never silently disagree.
//!
//! # Example
//!
//! ```ignore
//! use tumble_engine::physics::Transform;
//! use glam::Vec3;
//!
//! let mut t = Transform::from_position(Vec3::new(0.0, 2.0, 0.0));
//! t.set_rotation(Vec3::new(0.0, 45.0, 0.0));
//! let forward = t.orientation() * Vec3::NEG_Z;
//! ```

use serde::{Deserialize, Serialize};

use super::types::{EulerRot, Mat3, Quat, Vec3};

/// Position, rotation and scale of a physics object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World-space position
    pub position: Vec3,
    /// Per-axis scale applied to collider extents
    pub scale: Vec3,
    /// Euler angles in degrees, applied X then Y then Z
    rotation: Vec3,
    #[serde(skip, default = "identity")]
    cached: Quat,
    #[serde(skip, default = "dirty")]
    cache_dirty: bool,
}

fn identity() -> Quat {
    Quat::IDENTITY
}

fn dirty() -> bool {
    true
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            cached: Quat::IDENTITY,
            cache_dirty: false,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            scale,
            rotation: rotation_degrees,
            cached: Quat::IDENTITY,
            cache_dirty: true,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder-style scale override.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder-style rotation override (degrees).
    pub fn with_rotation(mut self, rotation_degrees: Vec3) -> Self {
        self.set_rotation(rotation_degrees);
        self
    }

    /// Euler angles in degrees.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Replaces the Euler angles and invalidates the cached quaternion.
    pub fn set_rotation(&mut self, rotation_degrees: Vec3) {
        self.rotation = rotation_degrees;
        self.cache_dirty = true;
    }

    /// Adds `delta_degrees` to the Euler angles (used by angular integration).
    pub fn rotate_by(&mut self, delta_degrees: Vec3) {
        self.rotation += delta_degrees;
        self.cache_dirty = true;
    }

    /// Sets orientation from a quaternion, updating Euler angles to match.
    pub fn set_orientation(&mut self, orientation: Quat) {
        let (x, y, z) = orientation.to_euler(EulerRot::XYZ);
        self.rotation = Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees());
        self.cached = orientation;
        self.cache_dirty = false;
    }

    /// Returns the orientation, refreshing the cache if the Euler angles changed.
    pub fn orientation_cached(&mut self) -> Quat {
        if self.cache_dirty {
            self.cached = euler_degrees_to_quat(self.rotation);
            self.cache_dirty = false;
        }
        self.cached
    }

    /// Returns the orientation without touching the cache.
    pub fn orientation(&self) -> Quat {
        if self.cache_dirty {
            euler_degrees_to_quat(self.rotation)
        } else {
            self.cached
        }
    }

    /// True when the cached quaternion is stale.
    pub fn is_orientation_dirty(&self) -> bool {
        self.cache_dirty
    }

    /// Rotation matrix whose columns are the local X, Y and Z axes in world space.
    pub fn rotation_matrix(&self) -> Mat3 {
        Mat3::from_quat(self.orientation())
    }

    /// Maps a point from local space (scale, rotate, translate) to world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation() * (local * self.scale)
    }
}

fn euler_degrees_to_quat(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}
