//! Geometry Tests - Box Separation, Closest Points and BVH Queries
//!
//! Properties of the geometry primitives over seeded random inputs:
//! resolve pushes separate overlapping boxes, triangle closest points beat
//! every sampled point on the triangle, and BVH queries never miss a
//! triangle whose bounds overlap the query box or that touches the query
//! sphere.

use glam::{EulerRot, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tumble_engine::physics::{Aabb, Bvh, MeshCollider, Obb, Triangle};

fn random_vec(rng: &mut StdRng, range: f32) -> Vec3 {
    Vec3::new(
        rng.random_range(-range..range),
        rng.random_range(-range..range),
        rng.random_range(-range..range),
    )
}

fn random_half_extents(rng: &mut StdRng) -> Vec3 {
    Vec3::new(
        rng.random_range(0.2..1.5),
        rng.random_range(0.2..1.5),
        rng.random_range(0.2..1.5),
    )
}

fn random_orientation(rng: &mut StdRng) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        rng.random_range(-3.1..3.1),
        rng.random_range(-3.1..3.1),
        rng.random_range(-3.1..3.1),
    )
}

// ============================================================================
// Resolve separates
// ============================================================================

#[test]
fn test_aabb_resolve_separates_overlapping_boxes() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut overlapping = 0;

    for _ in 0..500 {
        let a = Aabb::from_center_half_extents(random_vec(&mut rng, 1.5), random_half_extents(&mut rng));
        let b = Aabb::from_center_half_extents(random_vec(&mut rng, 1.5), random_half_extents(&mut rng));
        if !a.intersects(&b) {
            assert_eq!(a.resolve(&b), Vec3::ZERO);
            continue;
        }
        overlapping += 1;

        let push = a.resolve(&b);
        let moved = a.translated(push);
        // Exactly touching after the push, within rounding
        let residual = moved.resolve(&b).abs().max_element();
        assert!(residual < 1e-4, "Push {:?} left residual overlap {}", push, residual);
    }

    assert!(overlapping > 50, "Too few overlapping samples: {}", overlapping);
}

#[test]
fn test_obb_resolve_separates_rotated_boxes() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut overlapping = 0;

    for _ in 0..500 {
        let a = Obb::new(random_vec(&mut rng, 1.5), random_half_extents(&mut rng), random_orientation(&mut rng));
        let b = Obb::new(random_vec(&mut rng, 1.5), random_half_extents(&mut rng), random_orientation(&mut rng));
        let Some(contact) = a.penetration(&b) else {
            continue;
        };
        overlapping += 1;

        assert!(contact.depth > 0.0);
        assert!((contact.normal.length() - 1.0).abs() < 1e-4);

        let moved = Obb {
            center: a.center + a.resolve(&b),
            ..a
        };
        let residual = moved.penetration(&b).map_or(0.0, |p| p.depth);
        assert!(residual < 1e-3, "Residual depth {} after resolve", residual);
    }

    assert!(overlapping > 50, "Too few overlapping samples: {}", overlapping);
}

#[test]
fn test_axis_aligned_obb_matches_aabb_push() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut overlapping = 0;

    for _ in 0..500 {
        let a = Aabb::from_center_half_extents(random_vec(&mut rng, 1.5), random_half_extents(&mut rng));
        let b = Aabb::from_center_half_extents(random_vec(&mut rng, 1.5), random_half_extents(&mut rng));
        let oa = Obb::axis_aligned(a.center(), a.half_extents());
        let ob = Obb::axis_aligned(b.center(), b.half_extents());

        assert_eq!(a.intersects(&b), oa.intersects(&ob), "Overlap disagrees for {:?} {:?}", a, b);
        if a.intersects(&b) {
            overlapping += 1;
        }

        let aabb_push = a.resolve(&b);
        let obb_push = oa.resolve(&ob);
        assert!(
            (aabb_push - obb_push).length() < 1e-4,
            "AABB {:?} vs OBB {:?}",
            aabb_push,
            obb_push
        );
    }

    assert!(overlapping > 50, "Too few overlapping samples: {}", overlapping);
}

// ============================================================================
// Closest point on triangle
// ============================================================================

#[test]
fn test_triangle_closest_point_beats_sampled_points() {
    let mut rng = StdRng::seed_from_u64(5);

    for _ in 0..100 {
        let tri = Triangle::new(random_vec(&mut rng, 2.0), random_vec(&mut rng, 2.0), random_vec(&mut rng, 2.0));
        let p = random_vec(&mut rng, 4.0);
        let best = tri.closest_point(p).distance(p);

        let steps = 20;
        for i in 0..=steps {
            for j in 0..=(steps - i) {
                let u = i as f32 / steps as f32;
                let v = j as f32 / steps as f32;
                let sample = tri.a + (tri.b - tri.a) * u + (tri.c - tri.a) * v;
                assert!(
                    best <= sample.distance(p) + 1e-4,
                    "Closest distance {} beaten by sample at {}",
                    best,
                    sample.distance(p)
                );
            }
        }
    }
}

#[test]
fn test_triangle_closest_point_regions() {
    let tri = Triangle::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0));

    // Vertex region
    assert_eq!(tri.closest_point(Vec3::new(-1.0, 1.0, -1.0)), Vec3::ZERO);
    // Edge region
    let on_edge = tri.closest_point(Vec3::new(1.0, 3.0, -2.0));
    assert!((on_edge - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    // Face region
    let on_face = tri.closest_point(Vec3::new(0.5, 3.0, 0.5));
    assert!((on_face - Vec3::new(0.5, 0.0, 0.5)).length() < 1e-6);
}

// ============================================================================
// BVH
// ============================================================================

#[test]
fn test_bvh_query_is_superset_of_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    let triangles: Vec<Triangle> = (0..300)
        .map(|_| {
            let base = random_vec(&mut rng, 20.0);
            Triangle::new(
                base,
                base + random_vec(&mut rng, 1.0),
                base + random_vec(&mut rng, 1.0),
            )
        })
        .collect();
    let bvh = Bvh::build(&triangles);
    assert!(bvh.depth() <= 20);

    for _ in 0..200 {
        let query = Aabb::from_center_half_extents(random_vec(&mut rng, 20.0), Vec3::splat(rng.random_range(0.5..4.0)));
        let mut found = Vec::new();
        bvh.query(&query, &mut found);

        for (i, tri) in triangles.iter().enumerate() {
            if tri.bounds().intersects(&query) {
                assert!(found.contains(&i), "BVH query missed triangle {}", i);
            }
        }
    }
}

#[test]
fn test_sphere_candidates_cover_every_touching_triangle() {
    let mut rng = StdRng::seed_from_u64(77);
    let triangles: Vec<Triangle> = (0..300)
        .map(|_| {
            let base = random_vec(&mut rng, 20.0);
            Triangle::new(
                base,
                base + random_vec(&mut rng, 1.0),
                base + random_vec(&mut rng, 1.0),
            )
        })
        .collect();
    let mesh = MeshCollider::from_triangles(triangles.clone());
    let mut touching = 0;

    for query in 0..400 {
        // Half the spheres are centred near a triangle so plenty of them touch
        let center = if query % 2 == 0 {
            triangles[rng.random_range(0..triangles.len())].centroid() + random_vec(&mut rng, 1.0)
        } else {
            random_vec(&mut rng, 20.0)
        };
        let radius = rng.random_range(0.2..3.0);
        let candidates = mesh.sphere_candidates(center, radius);

        for (i, tri) in triangles.iter().enumerate() {
            if tri.sphere_push(center, radius).is_some() {
                touching += 1;
                assert!(
                    candidates.contains(&i),
                    "Sphere at {:?} r={} touches triangle {} but it is not a candidate",
                    center,
                    radius,
                    i
                );
            }
        }
    }

    assert!(touching > 100, "Too few touching samples: {}", touching);
}

#[test]
fn test_bvh_degenerate_input_terminates() {
    // Every centroid identical: partitioning cannot split, depth cap ends recursion
    let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Z);
    let triangles = vec![tri; 64];
    let bvh = Bvh::build(&triangles);
    assert!(!bvh.is_empty());
    assert!(bvh.depth() <= 20);

    let mut found = Vec::new();
    bvh.query(&Aabb::from_center_half_extents(Vec3::new(0.5, 0.0, 0.5), Vec3::splat(1.0)), &mut found);
    assert_eq!(found.len(), 64);
}

#[test]
fn test_empty_bvh_query_finds_nothing() {
    let bvh = Bvh::build(&[]);
    assert!(bvh.is_empty());
    let mut found = Vec::new();
    bvh.query(&Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE), &mut found);
    assert!(found.is_empty());
}
