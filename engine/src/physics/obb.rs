//! Oriented bounding boxes
//!
//! Boxes are rebuilt from the live transform on every query; nothing here is
//! cached between ticks.
//!
//! # Separating Axis Test
//!
//! Two boxes are disjoint iff their projections are disjoint on one of 15
//! candidate axes: the three face normals of each box and the nine cross
//! products of their edge directions. Cross products of (nearly) parallel
//! edges are skipped.
//!
//! # Example
//!
//! ```ignore
//! use tumble_engine::physics::Obb;
//! use glam::{Quat, Vec3};
//!
//! let a = Obb::axis_aligned(Vec3::ZERO, Vec3::ONE);
//! let b = Obb::new(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE, Quat::from_rotation_y(0.5));
//! if a.intersects(&b) {
//!     let push = a.resolve(&b); // move `a` by this to separate
//! }
//! ```

use super::transform::Transform;
use super::types::{AXIS_EPSILON, Quat, Vec3, try_normalize};

/// Contact normal and penetration depth between two shapes.
///
/// `normal` points away from the second shape, so moving the first shape by
/// `normal * depth` separates them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    pub normal: Vec3,
    pub depth: f32,
}

impl Penetration {
    pub fn push(&self) -> Vec3 {
        self.normal * self.depth
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    pub center: Vec3,
    pub half_extents: Vec3,
    /// Local X, Y, Z axes in world space (orthonormal)
    pub axes: [Vec3; 3],
}

impl Obb {
    pub fn new(center: Vec3, half_extents: Vec3, orientation: Quat) -> Self {
        Self {
            center,
            half_extents,
            axes: [orientation * Vec3::X, orientation * Vec3::Y, orientation * Vec3::Z],
        }
    }

    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
            axes: [Vec3::X, Vec3::Y, Vec3::Z],
        }
    }

    /// Box collider of `half_extents` at `offset` from the transform origin.
    /// The offset is not rotated; extents are scaled by the absolute scale.
    pub fn from_transform(transform: &Transform, offset: Vec3, half_extents: Vec3) -> Self {
        Self::new(
            transform.position + offset,
            half_extents * transform.scale.abs(),
            transform.orientation(),
        )
    }

    /// Radius of the box's projection onto `axis`.
    pub fn projected_radius(&self, axis: Vec3) -> f32 {
        self.half_extents.x * self.axes[0].dot(axis).abs()
            + self.half_extents.y * self.axes[1].dot(axis).abs()
            + self.half_extents.z * self.axes[2].dot(axis).abs()
    }

    /// Corner of the box furthest along `direction`.
    pub fn support(&self, direction: Vec3) -> Vec3 {
        let mut point = self.center;
        for i in 0..3 {
            let sign = if self.axes[i].dot(direction) >= 0.0 { 1.0 } else { -1.0 };
            point += self.axes[i] * self.half_extents[i] * sign;
        }
        point
    }

    /// Fifteen SAT candidates, minus degenerate cross products.
    fn candidate_axes(&self, other: &Obb) -> ([Vec3; 15], usize) {
        let mut axes = [Vec3::ZERO; 15];
        axes[..3].copy_from_slice(&self.axes);
        axes[3..6].copy_from_slice(&other.axes);
        let mut count = 6;
        for a in &self.axes {
            for b in &other.axes {
                if let Some(axis) = try_normalize(a.cross(*b)) {
                    axes[count] = axis;
                    count += 1;
                }
            }
        }
        (axes, count)
    }

    pub fn intersects(&self, other: &Obb) -> bool {
        let offset = other.center - self.center;
        let (axes, count) = self.candidate_axes(other);
        for &axis in &axes[..count] {
            let distance = offset.dot(axis).abs();
            if distance >= self.projected_radius(axis) + other.projected_radius(axis) {
                return false;
            }
        }
        true
    }

    /// Minimum-penetration axis, or `None` when a separating axis exists.
    ///
    /// The normal is oriented to push `self` away from `other`; when the
    /// centers coincide on the chosen axis the positive direction is used.
    pub fn penetration(&self, other: &Obb) -> Option<Penetration> {
        let offset = other.center - self.center;
        let mut best: Option<Penetration> = None;

        let (axes, count) = self.candidate_axes(other);
        for &axis in &axes[..count] {
            let distance = offset.dot(axis);
            let overlap =
                self.projected_radius(axis) + other.projected_radius(axis) - distance.abs();
            if overlap <= 0.0 {
                return None;
            }
            if best.is_none_or(|b| overlap < b.depth) {
                let normal = if distance <= 0.0 { axis } else { -axis };
                best = Some(Penetration {
                    normal,
                    depth: overlap,
                });
            }
        }
        best
    }

    /// Push that moves `self` out of `other`, zero if they are disjoint.
    pub fn resolve(&self, other: &Obb) -> Vec3 {
        self.penetration(other)
            .map(|p| p.push())
            .unwrap_or(Vec3::ZERO)
    }

    /// Closest point on or inside the box to `point`.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let local = point - self.center;
        let mut result = self.center;
        for i in 0..3 {
            let d = local
                .dot(self.axes[i])
                .clamp(-self.half_extents[i], self.half_extents[i]);
            result += self.axes[i] * d;
        }
        result
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = self.closest_point(center);
        (center - closest).length_squared() < radius * radius
    }

    /// Penetration of a sphere into the box, normal pointing from box to sphere.
    ///
    /// A sphere whose center is inside the box is pushed out through the
    /// nearest face.
    pub fn sphere_penetration(&self, center: Vec3, radius: f32) -> Option<Penetration> {
        let closest = self.closest_point(center);
        let diff = center - closest;
        let distance = diff.length();
        if distance >= radius {
            return None;
        }
        if distance > AXIS_EPSILON {
            return Some(Penetration {
                normal: diff / distance,
                depth: radius - distance,
            });
        }

        let local = center - self.center;
        let mut best = Penetration {
            normal: self.axes[0],
            depth: f32::MAX,
        };
        for i in 0..3 {
            let d = local.dot(self.axes[i]);
            let to_face = self.half_extents[i] - d.abs();
            if to_face < best.depth {
                best.normal = if d >= 0.0 { self.axes[i] } else { -self.axes[i] };
                best.depth = to_face;
            }
        }
        best.depth += radius;
        Some(best)
    }
}
