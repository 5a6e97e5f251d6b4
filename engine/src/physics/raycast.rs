//! Raycast queries
//!
//! Ray against world boxes (slab method on the world-scaled, axis-aligned
//! extents) and spheres (analytic quadratic). The world scans every sphere
//! and box collider and keeps the nearest hit within range; mesh colliders
//! are not ray targets.
//!
//! # Example
//!
//! ```ignore
//! use tumble_engine::physics::raycast::{ray_aabb_intersect, aabb_surface_normal};
//! use glam::Vec3;
//!
//! let origin = Vec3::new(0.0, 5.0, 0.0);
//! let direction = Vec3::NEG_Y;
//! let (min, max) = (Vec3::splat(-1.0), Vec3::splat(1.0));
//!
//! if let Some(t) = ray_aabb_intersect(origin, direction, min, max) {
//!     let point = origin + direction * t;              // (0, 1, 0)
//!     let normal = aabb_surface_normal(point, min, max); // +Y
//! }
//! ```

use super::collider::Collider;
use super::transform::Transform;
use super::types::Vec3;
use super::world::BodyHandle;

/// Nearest hit of a world raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Object that was hit
    pub handle: BodyHandle,
    /// World-space hit position
    pub point: Vec3,
    /// Outward surface normal at the hit point
    pub normal: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Ray-AABB intersection using the slab method.
///
/// Each axis clips the ray to the interval between its two planes; the ray
/// hits when the intersection of the three intervals is non-empty and not
/// entirely behind the origin. Axes the ray is parallel to contribute an
/// unbounded interval when the origin lies between their planes.
///
/// # Arguments
///
/// * `ray_origin` - Starting point of the ray
/// * `ray_dir` - Direction of the ray (must be normalized)
/// * `aabb_min` - Minimum corner of the AABB
/// * `aabb_max` - Maximum corner of the AABB
///
/// # Returns
///
/// * `Some(t)` - Distance to the entry point, or to the exit point when the
///   origin is inside the box
/// * `None` - No intersection, or the box is behind the origin
pub fn ray_aabb_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<f32> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray_origin[axis];
        let dir = ray_dir[axis];
        if dir.abs() < 1e-10 {
            if origin < aabb_min[axis] || origin > aabb_max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let t1 = (aabb_min[axis] - origin) * inv;
        let t2 = (aabb_max[axis] - origin) * inv;
        t_enter = t_enter.max(t1.min(t2));
        t_exit = t_exit.min(t1.max(t2));
    }

    if t_exit < t_enter || t_exit < 0.0 {
        None
    } else if t_enter >= 0.0 {
        Some(t_enter)
    } else {
        Some(t_exit)
    }
}

/// Outward normal of the AABB face nearest to `point`.
///
/// The point is mapped into unit-cube space and the axis with the largest
/// absolute coordinate picks the face.
pub fn aabb_surface_normal(point: Vec3, aabb_min: Vec3, aabb_max: Vec3) -> Vec3 {
    let center = (aabb_min + aabb_max) * 0.5;
    let half_extents = ((aabb_max - aabb_min) * 0.5).max(Vec3::splat(f32::EPSILON));
    let normalized = (point - center) / half_extents;
    let abs = normalized.abs();

    if abs.x >= abs.y && abs.x >= abs.z {
        Vec3::new(normalized.x.signum(), 0.0, 0.0)
    } else if abs.y >= abs.z {
        Vec3::new(0.0, normalized.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, normalized.z.signum())
    }
}

/// Ray-sphere intersection.
///
/// Solves `|o + t d - c|² = r²` for unit `d`. The nearer root is preferred;
/// when it lies behind the origin (origin inside the sphere) the farther
/// root is used.
pub fn ray_sphere_intersect(ray_origin: Vec3, ray_dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray_origin - center;
    let b = oc.dot(ray_dir);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let near = -b - root;
    let far = -b + root;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}

/// Hit point, normal and distance of a ray against one collider.
pub fn raycast_collider(
    origin: Vec3,
    direction: Vec3,
    transform: &Transform,
    collider: &Collider,
) -> Option<(Vec3, Vec3, f32)> {
    match collider {
        Collider::Sphere { radius, offset } => {
            let center = transform.position + *offset;
            let t = ray_sphere_intersect(origin, direction, center, *radius)?;
            let point = origin + direction * t;
            let normal = (point - center).normalize_or(Vec3::Y);
            Some((point, normal, t))
        }
        Collider::Box { .. } => {
            let bounds = collider.world_aabb(transform);
            let t = ray_aabb_intersect(origin, direction, bounds.min, bounds.max)?;
            let point = origin + direction * t;
            Some((point, aabb_surface_normal(point, bounds.min, bounds.max), t))
        }
        Collider::Mesh(_) => None,
    }
}

/// Scans `targets` and returns the nearest hit within `max_distance`.
///
/// A zero or non-finite direction never hits.
pub fn raycast_nearest<'a>(
    targets: impl IntoIterator<Item = (BodyHandle, &'a Transform, &'a Collider)>,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Option<RaycastHit> {
    let direction = direction.try_normalize()?;
    let mut closest: Option<RaycastHit> = None;
    let mut closest_dist = max_distance;

    for (handle, transform, collider) in targets {
        if let Some((point, normal, distance)) = raycast_collider(origin, direction, transform, collider) {
            if distance <= closest_dist {
                closest = Some(RaycastHit {
                    handle,
                    point,
                    normal,
                    distance,
                });
                closest_dist = distance;
            }
        }
    }

    closest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_aabb_from_front() {
        let origin = Vec3::new(0.0, 0.0, -5.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);
        let t = ray_aabb_intersect(origin, dir, Vec3::splat(-1.0), Vec3::splat(1.0)).unwrap();
        assert!((t - 4.0).abs() < 0.001, "Expected t=4.0, got t={}", t);
    }

    #[test]
    fn test_ray_misses_aabb() {
        let origin = Vec3::new(0.0, 5.0, -5.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);
        assert!(ray_aabb_intersect(origin, dir, Vec3::splat(-1.0), Vec3::splat(1.0)).is_none());
    }

    #[test]
    fn test_ray_starts_inside_aabb() {
        let dir = Vec3::new(0.0, 0.0, 1.0);
        let t = ray_aabb_intersect(Vec3::ZERO, dir, Vec3::splat(-1.0), Vec3::splat(1.0)).unwrap();
        // Should hit the exit face at z=1
        assert!((t - 1.0).abs() < 0.001, "Expected t=1.0, got t={}", t);
    }

    #[test]
    fn test_ray_aabb_behind_origin() {
        let origin = Vec3::new(0.0, 0.0, 5.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);
        assert!(ray_aabb_intersect(origin, dir, Vec3::splat(-1.0), Vec3::splat(1.0)).is_none());
    }

    #[test]
    fn test_surface_normal_faces() {
        let (min, max) = (Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(aabb_surface_normal(Vec3::new(1.0, 0.0, 0.0), min, max), Vec3::X);
        assert_eq!(aabb_surface_normal(Vec3::new(-1.0, 0.0, 0.0), min, max), Vec3::NEG_X);
        assert_eq!(aabb_surface_normal(Vec3::new(0.0, 1.0, 0.0), min, max), Vec3::Y);
        assert_eq!(aabb_surface_normal(Vec3::new(0.0, 0.2, -1.0), min, max), Vec3::NEG_Z);
    }

    #[test]
    fn test_ray_sphere_prefers_near_root() {
        let t = ray_sphere_intersect(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, Vec3::ZERO, 1.0).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_sphere_from_inside_uses_far_root() {
        let t = ray_sphere_intersect(Vec3::ZERO, Vec3::Z, Vec3::ZERO, 2.0).unwrap();
        assert!((t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_sphere_behind_or_miss() {
        assert!(ray_sphere_intersect(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, Vec3::ZERO, 1.0).is_none());
        assert!(ray_sphere_intersect(Vec3::new(0.0, 3.0, -5.0), Vec3::Z, Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn test_box_hit_uses_world_scale() {
        let t = Transform::default().with_scale(Vec3::new(1.0, 3.0, 1.0));
        let c = Collider::cuboid(Vec3::splat(0.5));
        let (point, normal, distance) =
            raycast_collider(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, &t, &c).unwrap();
        assert!((distance - 3.5).abs() < 1e-5);
        assert!((point.y - 1.5).abs() < 1e-5);
        assert_eq!(normal, Vec3::Y);
    }
}
