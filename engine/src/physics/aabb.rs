//! Axis-aligned bounding boxes
//!
//! Used by the character controller, BVH nodes and mesh queries. Overlap is
//! strict: boxes that only share a face do not intersect, so applying the
//! push returned by [`Aabb::resolve`] separates them.

use super::types::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// An inverted box that any `grow` call will replace.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Expands the box to contain `point`.
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Moves the box by `offset`.
    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Minimum translation that pushes `self` out of `other`.
    ///
    /// Six candidate pushes are considered (both directions on each axis, in
    /// +X, -X, +Y, -Y, +Z, -Z order) and the shortest wins; ties keep the
    /// earlier candidate. Returns zero when the boxes do not overlap.
    pub fn resolve(&self, other: &Aabb) -> Vec3 {
        if !self.intersects(other) {
            return Vec3::ZERO;
        }

        let candidates = [
            Vec3::new(other.max.x - self.min.x, 0.0, 0.0),
            Vec3::new(-(self.max.x - other.min.x), 0.0, 0.0),
            Vec3::new(0.0, other.max.y - self.min.y, 0.0),
            Vec3::new(0.0, -(self.max.y - other.min.y), 0.0),
            Vec3::new(0.0, 0.0, other.max.z - self.min.z),
            Vec3::new(0.0, 0.0, -(self.max.z - other.min.z)),
        ];

        let mut best = candidates[0];
        let mut best_depth = best.abs().max_element();
        for candidate in &candidates[1..] {
            let depth = candidate.abs().max_element();
            if depth < best_depth {
                best = *candidate;
                best_depth = depth;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(center: Vec3) -> Aabb {
        Aabb::from_center_half_extents(center, Vec3::splat(0.5))
    }

    #[test]
    fn test_disjoint_boxes_resolve_to_zero() {
        let a = unit_at(Vec3::ZERO);
        let b = unit_at(Vec3::new(3.0, 0.0, 0.0));
        assert!(!a.intersects(&b));
        assert_eq!(a.resolve(&b), Vec3::ZERO);
    }

    #[test]
    fn test_touching_boxes_do_not_intersect() {
        let a = unit_at(Vec3::ZERO);
        let b = unit_at(Vec3::new(1.0, 0.0, 0.0));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_resolve_picks_shallowest_axis() {
        let a = unit_at(Vec3::ZERO);
        let b = unit_at(Vec3::new(0.75, 0.25, 0.0));
        let push = a.resolve(&b);
        assert_eq!(push, Vec3::new(-0.25, 0.0, 0.0));
    }

    #[test]
    fn test_resolve_push_separates() {
        let a = unit_at(Vec3::new(0.0, 0.125, 0.0));
        let b = Aabb::from_center_half_extents(Vec3::new(0.0, -0.5, 0.0), Vec3::new(4.0, 0.5, 4.0));
        let push = a.resolve(&b);
        assert_eq!(push, Vec3::new(0.0, 0.375, 0.0));
        let moved = a.translated(push);
        assert!(!moved.intersects(&b));
    }

    #[test]
    fn test_grow_and_union() {
        let mut bounds = Aabb::empty();
        bounds.grow(Vec3::new(1.0, -2.0, 3.0));
        bounds.grow(Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));

        let other = unit_at(Vec3::new(5.0, 0.0, 0.0));
        let merged = bounds.union(&other);
        assert_eq!(merged.max.x, 5.5);
    }
}
