//! Sphere broad phase (CPU reference)
//!
//! Packs bodies into bounding spheres and enumerates overlapping index pairs.
//! The layouts here are shared with the GPU culler in
//! [`compute::broadphase`](crate::compute::broadphase), which must report
//! the same pair set for the same input.

use bytemuck::{Pod, Zeroable};

use super::types::Vec3;

/// Bounding sphere as uploaded to the GPU.
///
/// Layout (16 bytes) matches `Sphere` in broadphase.wgsl:
/// - position: vec3<f32> (12 bytes)
/// - radius: f32         (4 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BroadPhaseSphere {
    pub position: [f32; 3],
    pub radius: f32,
}

static_assertions::assert_eq_size!(BroadPhaseSphere, [u8; 16]);

impl BroadPhaseSphere {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position: position.to_array(),
            radius,
        }
    }

    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Strict overlap, the same comparison the shader makes.
    pub fn overlaps(&self, other: &BroadPhaseSphere) -> bool {
        let r = self.radius + other.radius;
        self.center().distance_squared(other.center()) < r * r
    }
}

/// Indices of two overlapping spheres, `a < b`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
pub struct CollisionPair {
    pub a: u32,
    pub b: u32,
}

static_assertions::assert_eq_size!(CollisionPair, [u8; 8]);

impl CollisionPair {
    /// Same pair with indices in ascending order.
    pub fn normalized(self) -> Self {
        if self.a <= self.b {
            self
        } else {
            Self { a: self.b, b: self.a }
        }
    }
}

/// Triangular O(n²) sweep: each sphere is tested against every later one.
pub fn detect_pairs_cpu(spheres: &[BroadPhaseSphere]) -> Vec<CollisionPair> {
    let mut pairs = Vec::new();
    for (i, a) in spheres.iter().enumerate() {
        for (j, b) in spheres.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                pairs.push(CollisionPair {
                    a: i as u32,
                    b: j as u32,
                });
            }
        }
    }
    pairs
}
