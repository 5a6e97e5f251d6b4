//! Collider shapes
//!
//! Sphere and box colliders derive their world-space shape from the owning
//! object's transform every time they are queried. Mesh colliders are baked
//! into world space once and never follow the object afterwards, which is
//! why the world only accepts them on static objects.
//!
//! # Example
//!
//! ```ignore
//! use tumble_engine::physics::{Collider, MeshCollider, Transform};
//! use glam::Vec3;
//!
//! let crate_box = Collider::cuboid(Vec3::splat(0.5));
//! let ball = Collider::sphere(0.25).with_offset(Vec3::new(0.0, 0.25, 0.0));
//!
//! let ground = Transform::default();
//! let mesh = MeshCollider::bake(&positions, Some(&indices), &ground);
//! let terrain = Collider::Mesh(mesh);
//! ```

use super::aabb::Aabb;
use super::bvh::Bvh;
use super::obb::Obb;
use super::transform::Transform;
use super::triangle::Triangle;
use super::types::Vec3;

/// Collision shape attached to a physics object.
#[derive(Debug, Clone)]
pub enum Collider {
    Sphere { radius: f32, offset: Vec3 },
    Box { half_extents: Vec3, offset: Vec3 },
    Mesh(MeshCollider),
}

/// World-space shape of a sphere or box collider at the current transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldShape {
    Sphere { center: Vec3, radius: f32 },
    Box(Obb),
}

impl Collider {
    pub fn sphere(radius: f32) -> Self {
        Collider::Sphere {
            radius,
            offset: Vec3::ZERO,
        }
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Collider::Box {
            half_extents,
            offset: Vec3::ZERO,
        }
    }

    /// Replaces the local offset of a sphere or box; meshes are unchanged.
    pub fn with_offset(mut self, new_offset: Vec3) -> Self {
        match &mut self {
            Collider::Sphere { offset, .. } | Collider::Box { offset, .. } => *offset = new_offset,
            Collider::Mesh(_) => {}
        }
        self
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self, Collider::Mesh(_))
    }

    /// Collider center: transform position plus the (unrotated) offset.
    pub fn world_center(&self, transform: &Transform) -> Vec3 {
        match self {
            Collider::Sphere { offset, .. } | Collider::Box { offset, .. } => {
                transform.position + *offset
            }
            Collider::Mesh(mesh) => mesh.bounds().map(|b| b.center()).unwrap_or(transform.position),
        }
    }

    /// Sphere or oriented box at the current transform, `None` for meshes.
    pub fn world_shape(&self, transform: &Transform) -> Option<WorldShape> {
        match self {
            Collider::Sphere { radius, offset } => Some(WorldShape::Sphere {
                center: transform.position + *offset,
                radius: *radius,
            }),
            Collider::Box {
                half_extents,
                offset,
            } => Some(WorldShape::Box(Obb::from_transform(
                transform,
                *offset,
                *half_extents,
            ))),
            Collider::Mesh(_) => None,
        }
    }

    /// Axis-aligned box ignoring rotation (scaled extents around the center).
    ///
    /// This is the box the character controller and raycasts test against.
    pub fn world_aabb(&self, transform: &Transform) -> Aabb {
        match self {
            Collider::Sphere { radius, offset } => {
                Aabb::from_center_half_extents(transform.position + *offset, Vec3::splat(*radius))
            }
            Collider::Box {
                half_extents,
                offset,
            } => Aabb::from_center_half_extents(
                transform.position + *offset,
                *half_extents * transform.scale.abs(),
            ),
            Collider::Mesh(mesh) => mesh
                .bounds()
                .unwrap_or_else(|| Aabb::from_center_half_extents(transform.position, Vec3::ZERO)),
        }
    }

    /// Radius of a sphere enclosing the collider, used by the GPU broad phase
    /// and by mesh queries against moving colliders.
    pub fn bounding_radius(&self, transform: &Transform) -> f32 {
        match self {
            Collider::Sphere { radius, .. } => *radius,
            Collider::Box { half_extents, .. } => (*half_extents * transform.scale.abs()).length(),
            Collider::Mesh(mesh) => mesh.bounds().map(|b| b.half_extents().length()).unwrap_or(0.0),
        }
    }

    /// Sphere approximation used against mesh colliders: the sphere itself,
    /// or the largest sphere inscribed in a box.
    pub fn mesh_probe_sphere(&self, transform: &Transform) -> Option<(Vec3, f32)> {
        match self {
            Collider::Sphere { radius, offset } => Some((transform.position + *offset, *radius)),
            Collider::Box {
                half_extents,
                offset,
            } => Some((
                transform.position + *offset,
                (*half_extents * transform.scale.abs()).min_element(),
            )),
            Collider::Mesh(_) => None,
        }
    }
}

// =============================================================================
// MeshCollider - baked triangle soup with BVH
// =============================================================================

/// Triangle mesh collider baked into world space.
#[derive(Debug, Clone, Default)]
pub struct MeshCollider {
    triangles: Vec<Triangle>,
    bvh: Bvh,
    bounds: Option<Aabb>,
}

impl MeshCollider {
    /// Transforms `positions` by `transform` and builds the BVH.
    ///
    /// Without `indices`, consecutive position triples form triangles.
    /// Trailing partial triangles and out-of-range indices are skipped, so
    /// malformed input yields fewer (possibly zero) triangles.
    pub fn bake(positions: &[Vec3], indices: Option<&[u32]>, transform: &Transform) -> Self {
        let world: Vec<Vec3> = positions
            .iter()
            .map(|&p| transform.transform_point(p))
            .collect();

        let mut triangles = Vec::new();
        let mut skipped = 0usize;
        match indices {
            Some(indices) => {
                for tri in indices.chunks(3) {
                    let corners = (tri.len() == 3)
                        .then(|| (world.get(tri[0] as usize), world.get(tri[1] as usize), world.get(tri[2] as usize)));
                    match corners {
                        Some((Some(&a), Some(&b), Some(&c))) => triangles.push(Triangle::new(a, b, c)),
                        _ => skipped += 1,
                    }
                }
            }
            None => {
                for tri in world.chunks(3) {
                    if let [a, b, c] = tri {
                        triangles.push(Triangle::new(*a, *b, *c));
                    } else {
                        skipped += 1;
                    }
                }
            }
        }

        if skipped > 0 {
            log::warn!("Mesh collider bake skipped {} malformed triangle(s)", skipped);
        }

        Self::from_triangles(triangles)
    }

    /// Builds a collider from triangles that are already in world space.
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let bounds = triangles
            .iter()
            .map(Triangle::bounds)
            .reduce(|acc, b| acc.union(&b));
        let bvh = Bvh::build(&triangles);
        log::debug!(
            "Baked mesh collider: {} triangles, {} BVH nodes",
            triangles.len(),
            bvh.node_count()
        );
        Self {
            triangles,
            bvh,
            bounds,
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Indices of triangles that may touch the sphere (BVH candidates).
    pub fn sphere_candidates(&self, center: Vec3, radius: f32) -> Vec<usize> {
        let mut out = Vec::new();
        let query = Aabb::from_center_half_extents(center, Vec3::splat(radius));
        self.bvh.query(&query, &mut out);
        out
    }

    /// Push that moves a sphere out of the mesh, `None` if nothing touches.
    ///
    /// Per axis, the largest-magnitude push over all touching triangles wins,
    /// which keeps a sphere resting on two coplanar triangles from being
    /// pushed twice.
    pub fn sphere_push(&self, center: Vec3, radius: f32) -> Option<Vec3> {
        let mut total = Vec3::ZERO;
        let mut hit = false;
        for i in self.sphere_candidates(center, radius) {
            if let Some(push) = self.triangles[i].sphere_push(center, radius) {
                hit = true;
                for axis in 0..3 {
                    if push[axis].abs() > total[axis].abs() {
                        total[axis] = push[axis];
                    }
                }
            }
        }
        hit.then_some(total)
    }
}
