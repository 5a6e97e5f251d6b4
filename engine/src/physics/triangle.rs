//! World-space triangles for mesh colliders

use super::aabb::Aabb;
use super::types::{AXIS_EPSILON, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
    /// Unit face normal (zero for degenerate triangles)
    pub normal: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        Self { a, b, c, normal }
    }

    pub fn centroid(&self) -> Vec3 {
        (self.a + self.b + self.c) / 3.0
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.a.min(self.b).min(self.c), self.a.max(self.b).max(self.c))
    }

    /// Closest point on the triangle to `p`.
    ///
    /// Voronoi-region walk: the three vertex regions, the three edge regions,
    /// then the face interior via barycentric coordinates.
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let (a, b, c) = (self.a, self.b, self.c);
        let ab = b - a;
        let ac = c - a;
        let ap = p - a;

        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        let cp = p - c;
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        a + ab * v + ac * w
    }

    /// Push that moves a sphere out of this triangle, if they touch.
    ///
    /// A center lying on the triangle is pushed along the face normal by the
    /// full radius.
    pub fn sphere_push(&self, center: Vec3, radius: f32) -> Option<Vec3> {
        let closest = self.closest_point(center);
        let diff = center - closest;
        let dist_sq = diff.length_squared();
        if dist_sq >= radius * radius {
            return None;
        }
        let dist = dist_sq.sqrt();
        if dist > AXIS_EPSILON {
            Some(diff / dist * (radius - dist))
        } else {
            Some(self.normal * radius)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
            Vec3::new(4.0, 0.0, 0.0),
        )
    }

    #[test]
    fn test_normal_follows_winding() {
        let t = floor_triangle();
        assert!((t.normal - Vec3::Y).length() < 1e-6, "got {:?}", t.normal);
    }

    #[test]
    fn test_closest_point_regions() {
        let t = floor_triangle();
        // Face interior
        assert_eq!(t.closest_point(Vec3::new(1.0, 3.0, 1.0)), Vec3::new(1.0, 0.0, 1.0));
        // Vertex region behind a
        assert_eq!(t.closest_point(Vec3::new(-1.0, 1.0, -1.0)), Vec3::ZERO);
        // Edge region along a-c (the x axis)
        let on_edge = t.closest_point(Vec3::new(2.0, 0.0, -3.0));
        assert!((on_edge - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
        // Hypotenuse b-c
        let hyp = t.closest_point(Vec3::new(3.0, 0.0, 3.0));
        assert!((hyp - Vec3::new(2.0, 0.0, 2.0)).length() < 1e-5, "got {:?}", hyp);
    }

    #[test]
    fn test_sphere_push_out_of_face() {
        let t = floor_triangle();
        let push = t.sphere_push(Vec3::new(1.0, 0.3, 1.0), 0.5).unwrap();
        assert!((push - Vec3::new(0.0, 0.2, 0.0)).length() < 1e-5, "got {:?}", push);
        assert!(t.sphere_push(Vec3::new(1.0, 0.6, 1.0), 0.5).is_none());
    }

    #[test]
    fn test_sphere_centered_on_face_pushes_along_normal() {
        let t = floor_triangle();
        let push = t.sphere_push(Vec3::new(1.0, 0.0, 1.0), 0.5).unwrap();
        assert!((push - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-6);
    }
}
