//! Collision resolver
//!
//! Narrow phase and response for one classified pair. The world decides
//! which routine a pair goes through; each routine computes penetration with
//! the geometry primitives, separates the bodies, exchanges impulses and
//! records the contact.
//!
//! # Routines
//!
//! - [`resolve_dynamic_pair`]: two dynamic bodies (sphere-sphere, sphere-box, box-box)
//! - [`resolve_dynamic_static`]: dynamic body against a static sphere or box
//! - [`resolve_kinematic_dynamic`]: kinematic body pushing a dynamic one
//! - [`resolve_kinematic_static`]: kinematic body blocked by static geometry
//! - [`resolve_against_mesh`]: kinematic or dynamic body against a static mesh
//!
//! # Response
//!
//! Positional correction is split by inverse mass:
//! `push_a = push * w_a / (w_a + w_b)`, `push_b = -push * w_b / (w_a + w_b)`
//! with `w = 1/m`. A mass that is zero, negative or not finite counts as
//! infinite. Static and kinematic bodies have infinite mass and take no
//! correction. If the bodies approach along the
//! normal, an impulse `j = -(1 + e) * v_n / (1/m_a + 1/m_b)` with
//! `e = (bounciness_a + bounciness_b) / 2` is applied, tangential relative
//! velocity is damped by `1 - friction`, and spin is derived from the
//! velocity change at an estimated contact point, scaled by the tunables in
//! [`ResponseTuning`].
//!
//! Pairs missing a rigidbody or collider never reach these routines; shapes
//! that cannot be tested against each other are skipped silently.

use slotmap::SecondaryMap;

use super::collider::{Collider, WorldShape};
use super::config::{PhysicsConfig, ResponseTuning};
use super::contact::ContactTracker;
use super::obb::Penetration;
use super::rigidbody::RigidBody;
use super::transform::Transform;
use super::types::{AXIS_EPSILON, Vec3, try_normalize};
use super::world::BodyHandle;

/// Moving side of a pair (dynamic or kinematic).
pub(crate) struct Mover<'a> {
    pub handle: BodyHandle,
    pub transform: &'a mut Transform,
    pub body: &'a mut RigidBody,
    pub collider: &'a Collider,
}

/// Static side of a pair.
pub(crate) struct Fixed<'a> {
    pub handle: BodyHandle,
    pub transform: &'a Transform,
    pub collider: &'a Collider,
}

/// World state the routines write besides the bodies themselves.
pub(crate) struct ResolveContext<'a> {
    pub config: &'a PhysicsConfig,
    pub contacts: &'a mut ContactTracker,
    /// Upward support forces applied during the next integration
    pub support_forces: &'a mut SecondaryMap<BodyHandle, Vec3>,
}

impl ResolveContext<'_> {
    fn tuning(&self) -> &ResponseTuning {
        &self.config.response
    }

    fn wake_speed(&self) -> f32 {
        self.config.sleep.velocity_threshold * self.config.sleep.wake_speed_multiplier
    }

    fn add_support(&mut self, handle: BodyHandle, mass: f32) {
        if !(mass.is_finite() && mass > 0.0) {
            return;
        }
        let force = -self.config.gravity * mass;
        match self.support_forces.get_mut(handle) {
            Some(existing) => *existing += force,
            None => {
                self.support_forces.insert(handle, force);
            }
        }
    }
}

// =============================================================================
// Narrow phase
// =============================================================================

/// Penetration of `a` into `b`; the normal points from `b` toward `a`.
pub fn shape_penetration(a: &WorldShape, b: &WorldShape) -> Option<Penetration> {
    match (a, b) {
        (
            WorldShape::Sphere {
                center: ca,
                radius: ra,
            },
            WorldShape::Sphere {
                center: cb,
                radius: rb,
            },
        ) => {
            let diff = *ca - *cb;
            let distance = diff.length();
            let reach = ra + rb;
            if distance >= reach || distance < AXIS_EPSILON {
                return None;
            }
            Some(Penetration {
                normal: diff / distance,
                depth: reach - distance,
            })
        }
        (WorldShape::Sphere { center, radius }, WorldShape::Box(obb)) => {
            obb.sphere_penetration(*center, *radius)
        }
        (WorldShape::Box(obb), WorldShape::Sphere { center, radius }) => obb
            .sphere_penetration(*center, *radius)
            .map(|p| Penetration {
                normal: -p.normal,
                depth: p.depth,
            }),
        (WorldShape::Box(a), WorldShape::Box(b)) => a.penetration(b),
    }
}

fn shape_center(shape: &WorldShape) -> Vec3 {
    match shape {
        WorldShape::Sphere { center, .. } => *center,
        WorldShape::Box(obb) => obb.center,
    }
}

/// Estimated contact point on `shape`.
///
/// Spheres use the surface point along `toward` (unit direction to the other
/// body); boxes use their point closest to the other body's center, which
/// lands on a corner, edge or face depending on how the bodies meet.
fn contact_point(shape: &WorldShape, toward: Vec3, other_center: Vec3) -> Vec3 {
    match shape {
        WorldShape::Sphere { center, radius } => *center + toward * *radius,
        WorldShape::Box(obb) => obb.closest_point(other_center),
    }
}

fn torque_scale(tuning: &ResponseTuning, a: &WorldShape, b: &WorldShape) -> f32 {
    match (a, b) {
        (WorldShape::Box(_), WorldShape::Box(_)) => tuning.box_torque_scale,
        _ => tuning.sphere_torque_scale,
    }
}

/// Scales the component of `v` perpendicular to `normal`.
fn damp_tangential(v: Vec3, normal: Vec3, keep: f32) -> Vec3 {
    let along = normal * v.dot(normal);
    along + (v - along) * keep
}

// =============================================================================
// Dynamic-Dynamic
// =============================================================================

/// Two dynamic bodies. Skipped when both sleep.
pub(crate) fn resolve_dynamic_pair(ctx: &mut ResolveContext<'_>, a: Mover<'_>, b: Mover<'_>) {
    if a.body.is_sleeping() && b.body.is_sleeping() {
        return;
    }
    let (Some(shape_a), Some(shape_b)) = (
        a.collider.world_shape(a.transform),
        b.collider.world_shape(b.transform),
    ) else {
        return;
    };
    let Some(contact) = shape_penetration(&shape_a, &shape_b) else {
        return;
    };

    let n = contact.normal;
    let relative = a.body.velocity - b.body.velocity;
    let rel_speed = relative.length();

    ctx.contacts.record(a.handle, b.handle);
    if rel_speed > ctx.wake_speed() {
        a.body.wake();
        b.body.wake();
    }

    // Positional correction, split by inverse mass
    let inv_a = a.body.inverse_mass();
    let inv_b = b.body.inverse_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return;
    }
    let push = contact.push();
    a.transform.position += push * (inv_a / inv_sum);
    b.transform.position -= push * (inv_b / inv_sum);

    let avg_friction = (a.body.friction + b.body.friction) * 0.5;
    let both_spheres = matches!(
        (&shape_a, &shape_b),
        (WorldShape::Sphere { .. }, WorldShape::Sphere { .. })
    );

    let tuning = ctx.tuning().clone();
    if both_spheres
        && rel_speed < tuning.resting_speed
        && contact.depth < tuning.resting_penetration
    {
        apply_resting_contact(ctx, a, b, n, avg_friction);
        return;
    }

    let vn = relative.dot(n);
    if vn >= 0.0 {
        return;
    }

    let e = (a.body.bounciness + b.body.bounciness) * 0.5;
    let j = -(1.0 + e) * vn / inv_sum;

    let before_a = a.body.velocity;
    let before_b = b.body.velocity;
    a.body.velocity += n * (j * inv_a);
    b.body.velocity -= n * (j * inv_b);

    let keep = 1.0 - avg_friction;
    a.body.velocity = damp_tangential(a.body.velocity, n, keep);
    b.body.velocity = damp_tangential(b.body.velocity, n, keep);

    let scale = torque_scale(&tuning, &shape_a, &shape_b);
    let center_a = shape_center(&shape_a);
    let center_b = shape_center(&shape_b);
    let arm_a = contact_point(&shape_a, -n, center_b) - center_a;
    let arm_b = contact_point(&shape_b, n, center_a) - center_b;
    a.body.angular_velocity += arm_a.cross(a.body.velocity - before_a) * scale;
    b.body.angular_velocity += arm_b.cross(b.body.velocity - before_b) * scale;
}

/// Slow, shallow sphere contacts: damp hard, hold the upper body up against
/// gravity on the next tick, and snap tiny velocities to zero.
fn apply_resting_contact(
    ctx: &mut ResolveContext<'_>,
    a: Mover<'_>,
    b: Mover<'_>,
    n: Vec3,
    avg_friction: f32,
) {
    let tuning = ctx.tuning().clone();
    let keep = 1.0 - avg_friction;
    a.body.velocity *= keep;
    b.body.velocity *= keep;

    if n.y > tuning.ground_normal_y {
        ctx.add_support(a.handle, a.body.mass);
    } else if n.y < -tuning.ground_normal_y {
        ctx.add_support(b.handle, b.body.mass);
    }

    for body in [a.body, b.body] {
        if body.velocity.length() < tuning.resting_snap_speed {
            body.velocity = Vec3::ZERO;
        }
    }
}

// =============================================================================
// Against immovable bodies
// =============================================================================

/// Impulse, friction and spin for a dynamic body hitting something of
/// infinite mass moving at `other_velocity`.
#[allow(clippy::too_many_arguments)]
fn respond_to_immovable(
    tuning: &ResponseTuning,
    body: &mut RigidBody,
    normal: Vec3,
    other_velocity: Vec3,
    restitution: f32,
    friction: f32,
    arm: Vec3,
    torque_scale: f32,
) {
    let relative = body.velocity - other_velocity;
    let vn = relative.dot(normal);
    if vn >= 0.0 {
        return;
    }

    let before = body.velocity;
    let bounced = relative - normal * ((1.0 + restitution) * vn);
    body.velocity = other_velocity + damp_tangential(bounced, normal, 1.0 - friction);
    body.angular_velocity += arm.cross(body.velocity - before) * torque_scale;

    if normal.y > tuning.ground_normal_y {
        let keep = 1.0 - friction * tuning.ground_spin_friction;
        body.angular_velocity.x *= keep;
        body.angular_velocity.z *= keep;
    }
}

/// Dynamic sphere or box against a static sphere or box.
pub(crate) fn resolve_dynamic_static(ctx: &mut ResolveContext<'_>, mover: Mover<'_>, fixed: Fixed<'_>) {
    let (Some(shape), Some(other)) = (
        mover.collider.world_shape(mover.transform),
        fixed.collider.world_shape(fixed.transform),
    ) else {
        return;
    };
    let Some(contact) = shape_penetration(&shape, &other) else {
        return;
    };

    ctx.contacts.record(mover.handle, fixed.handle);
    mover.transform.position += contact.push();

    let n = contact.normal;
    let arm = contact_point(&shape, -n, shape_center(&other)) - shape_center(&shape);
    let scale = torque_scale(ctx.tuning(), &shape, &other);
    let (bounciness, friction) = (mover.body.bounciness, mover.body.friction);
    respond_to_immovable(ctx.tuning(), mover.body, n, Vec3::ZERO, bounciness, friction, arm, scale);
}

/// Kinematic body driving into a dynamic one. Only the dynamic body moves.
pub(crate) fn resolve_kinematic_dynamic(
    ctx: &mut ResolveContext<'_>,
    kinematic: Mover<'_>,
    dynamic: Mover<'_>,
) {
    let (Some(kin_shape), Some(dyn_shape)) = (
        kinematic.collider.world_shape(kinematic.transform),
        dynamic.collider.world_shape(dynamic.transform),
    ) else {
        return;
    };
    let Some(contact) = shape_penetration(&dyn_shape, &kin_shape) else {
        return;
    };

    ctx.contacts.record(kinematic.handle, dynamic.handle);
    dynamic.body.wake();
    dynamic.transform.position += contact.push();

    let n = contact.normal;
    let arm = contact_point(&dyn_shape, -n, shape_center(&kin_shape)) - shape_center(&dyn_shape);
    let scale = torque_scale(ctx.tuning(), &dyn_shape, &kin_shape);
    let restitution = (kinematic.body.bounciness + dynamic.body.bounciness) * 0.5;
    let friction = (kinematic.body.friction + dynamic.body.friction) * 0.5;
    respond_to_immovable(
        ctx.tuning(),
        dynamic.body,
        n,
        kinematic.body.velocity,
        restitution,
        friction,
        arm,
        scale,
    );
}

/// Kinematic body blocked by static geometry: pushed out, no impulse.
pub(crate) fn resolve_kinematic_static(ctx: &mut ResolveContext<'_>, kinematic: Mover<'_>, fixed: Fixed<'_>) {
    let (Some(shape), Some(other)) = (
        kinematic.collider.world_shape(kinematic.transform),
        fixed.collider.world_shape(fixed.transform),
    ) else {
        return;
    };
    let Some(contact) = shape_penetration(&shape, &other) else {
        return;
    };
    ctx.contacts.record(kinematic.handle, fixed.handle);
    kinematic.transform.position += contact.push();
}

/// Moving body against a static mesh, approximated by its probe sphere.
///
/// Dynamic bodies also receive an impulse; kinematic bodies are only pushed.
pub(crate) fn resolve_against_mesh(ctx: &mut ResolveContext<'_>, mover: Mover<'_>, mesh: Fixed<'_>) {
    let Collider::Mesh(mesh_collider) = mesh.collider else {
        return;
    };
    let Some((center, radius)) = mover.collider.mesh_probe_sphere(mover.transform) else {
        return;
    };
    let Some(push) = mesh_collider.sphere_push(center, radius) else {
        return;
    };

    ctx.contacts.record(mover.handle, mesh.handle);
    mover.transform.position += push;

    if mover.body.is_kinematic {
        return;
    }
    let Some(n) = try_normalize(push) else {
        return;
    };
    let (bounciness, friction) = (mover.body.bounciness, mover.body.friction);
    let scale = ctx.tuning().mesh_torque_scale;
    respond_to_immovable(
        ctx.tuning(),
        mover.body,
        n,
        Vec3::ZERO,
        bounciness,
        friction,
        -n * radius,
        scale,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::obb::Obb;
    use slotmap::SlotMap;

    struct Fixture {
        handles: Vec<BodyHandle>,
        config: PhysicsConfig,
        contacts: ContactTracker,
        support: SecondaryMap<BodyHandle, Vec3>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut keys: SlotMap<BodyHandle, ()> = SlotMap::with_key();
            Self {
                handles: (0..4).map(|_| keys.insert(())).collect(),
                config: PhysicsConfig::default(),
                contacts: ContactTracker::new(),
                support: SecondaryMap::new(),
            }
        }

        fn ctx(&mut self) -> ResolveContext<'_> {
            ResolveContext {
                config: &self.config,
                contacts: &mut self.contacts,
                support_forces: &mut self.support,
            }
        }
    }

    #[test]
    fn test_elastic_equal_mass_spheres_reverse_relative_velocity() {
        let mut fx = Fixture::new();
        let (ha, hb) = (fx.handles[0], fx.handles[1]);
        let sphere = Collider::sphere(0.5);

        let mut ta = Transform::from_position(Vec3::new(-0.45, 0.0, 0.0));
        let mut tb = Transform::from_position(Vec3::new(0.45, 0.1, 0.0));
        let mut ra = RigidBody::default()
            .with_bounciness(1.0)
            .with_velocity(Vec3::new(3.0, 0.5, -1.0));
        let mut rb = RigidBody::default()
            .with_bounciness(1.0)
            .with_velocity(Vec3::new(-2.0, 0.0, 0.5));

        let normal = (ta.position - tb.position).normalize();
        let vn_before = (ra.velocity - rb.velocity).dot(normal);

        let mut ctx = fx.ctx();
        resolve_dynamic_pair(
            &mut ctx,
            Mover { handle: ha, transform: &mut ta, body: &mut ra, collider: &sphere },
            Mover { handle: hb, transform: &mut tb, body: &mut rb, collider: &sphere },
        );

        let vn_after = (ra.velocity - rb.velocity).dot(normal);
        assert!(vn_before < 0.0);
        assert!((vn_after + vn_before).abs() < 1e-4, "before {} after {}", vn_before, vn_after);
    }

    #[test]
    fn test_dynamic_pair_mass_split() {
        let mut fx = Fixture::new();
        let (ha, hb) = (fx.handles[0], fx.handles[1]);
        let cube = Collider::cuboid(Vec3::splat(0.5));

        let mut ta = Transform::from_position(Vec3::new(-0.25, 0.0, 0.0));
        let mut tb = Transform::from_position(Vec3::new(0.25, 0.0, 0.0));
        let mut ra = RigidBody::new(3.0).with_gravity(false);
        let mut rb = RigidBody::new(1.0).with_gravity(false);

        let mut ctx = fx.ctx();
        resolve_dynamic_pair(
            &mut ctx,
            Mover { handle: ha, transform: &mut ta, body: &mut ra, collider: &cube },
            Mover { handle: hb, transform: &mut tb, body: &mut rb, collider: &cube },
        );

        // Overlap 0.5 along X: heavy body moves a quarter, light body three quarters
        assert!((ta.position.x + 0.375).abs() < 1e-5, "a.x = {}", ta.position.x);
        assert!((tb.position.x - 0.625).abs() < 1e-5, "b.x = {}", tb.position.x);
        assert!(fx.contacts.finish_tick().len() == 1);
    }

    #[test]
    fn test_both_sleeping_is_skipped() {
        let mut fx = Fixture::new();
        let (ha, hb) = (fx.handles[0], fx.handles[1]);
        let sphere = Collider::sphere(1.0);
        let mut ta = Transform::default();
        let mut tb = Transform::from_position(Vec3::new(0.5, 0.0, 0.0));
        let mut ra = RigidBody::default();
        let mut rb = RigidBody::default();
        ra.sleep();
        rb.sleep();

        let mut ctx = fx.ctx();
        resolve_dynamic_pair(
            &mut ctx,
            Mover { handle: ha, transform: &mut ta, body: &mut ra, collider: &sphere },
            Mover { handle: hb, transform: &mut tb, body: &mut rb, collider: &sphere },
        );
        assert_eq!(ta.position, Vec3::ZERO);
        assert!(fx.contacts.finish_tick().is_empty());
    }

    #[test]
    fn test_resting_spheres_add_support_to_upper_body() {
        let mut fx = Fixture::new();
        let (ha, hb) = (fx.handles[0], fx.handles[1]);
        let sphere = Collider::sphere(0.5);
        let mut upper = Transform::from_position(Vec3::new(0.0, 0.95, 0.0));
        let mut lower = Transform::default();
        let mut ru = RigidBody::new(2.0).with_velocity(Vec3::new(0.0, -0.05, 0.0));
        let mut rl = RigidBody::default();

        let mut ctx = fx.ctx();
        resolve_dynamic_pair(
            &mut ctx,
            Mover { handle: ha, transform: &mut upper, body: &mut ru, collider: &sphere },
            Mover { handle: hb, transform: &mut lower, body: &mut rl, collider: &sphere },
        );

        let support = fx.support.get(ha).copied().unwrap_or(Vec3::ZERO);
        assert!((support.y - 40.0).abs() < 1e-4, "support {:?}", support);
        assert!(fx.support.get(hb).is_none());
        assert_eq!(ru.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_dynamic_sphere_bounces_off_static_box() {
        let mut fx = Fixture::new();
        let (hd, hs) = (fx.handles[0], fx.handles[1]);
        let ball = Collider::sphere(0.5);
        let floor = Collider::cuboid(Vec3::new(10.0, 0.5, 10.0));
        let floor_t = Transform::from_position(Vec3::new(0.0, -0.5, 0.0));

        let mut t = Transform::from_position(Vec3::new(0.0, 0.4, 0.0));
        let mut rb = RigidBody::default()
            .with_bounciness(0.5)
            .with_friction(0.0)
            .with_velocity(Vec3::new(0.0, -4.0, 0.0));

        let mut ctx = fx.ctx();
        resolve_dynamic_static(
            &mut ctx,
            Mover { handle: hd, transform: &mut t, body: &mut rb, collider: &ball },
            Fixed { handle: hs, transform: &floor_t, collider: &floor },
        );

        assert!((t.position.y - 0.5).abs() < 1e-5, "y = {}", t.position.y);
        assert!((rb.velocity.y - 2.0).abs() < 1e-5, "vy = {}", rb.velocity.y);
    }

    #[test]
    fn test_kinematic_pushes_dynamic_without_moving() {
        let mut fx = Fixture::new();
        let (hk, hd) = (fx.handles[0], fx.handles[1]);
        let cube = Collider::cuboid(Vec3::splat(0.5));

        let mut tk = Transform::default();
        let mut rk = RigidBody::kinematic().with_velocity(Vec3::new(2.0, 0.0, 0.0));
        let mut td = Transform::from_position(Vec3::new(0.75, 0.0, 0.0));
        let mut rd = RigidBody::default().with_gravity(false);
        rd.sleep();

        let mut ctx = fx.ctx();
        resolve_kinematic_dynamic(
            &mut ctx,
            Mover { handle: hk, transform: &mut tk, body: &mut rk, collider: &cube },
            Mover { handle: hd, transform: &mut td, body: &mut rd, collider: &cube },
        );

        assert_eq!(tk.position, Vec3::ZERO);
        assert!((td.position.x - 1.0).abs() < 1e-5);
        assert!(!rd.is_sleeping());
        assert!(rd.velocity.x > 2.0, "vx = {}", rd.velocity.x);
    }

    #[test]
    fn test_kinematic_blocked_by_static() {
        let mut fx = Fixture::new();
        let (hk, hs) = (fx.handles[0], fx.handles[1]);
        let cube = Collider::cuboid(Vec3::splat(0.5));
        let wall_t = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let mut tk = Transform::from_position(Vec3::new(0.25, 0.0, 0.0));
        let mut rk = RigidBody::kinematic();

        let mut ctx = fx.ctx();
        resolve_kinematic_static(
            &mut ctx,
            Mover { handle: hk, transform: &mut tk, body: &mut rk, collider: &cube },
            Fixed { handle: hs, transform: &wall_t, collider: &cube },
        );
        assert!((tk.position.x - 0.0).abs() < 1e-5, "x = {}", tk.position.x);
    }

    #[test]
    fn test_box_box_penetration_normal_points_at_first() {
        let a = WorldShape::Box(Obb::axis_aligned(Vec3::new(0.0, 0.8, 0.0), Vec3::splat(0.5)));
        let b = WorldShape::Box(Obb::axis_aligned(Vec3::ZERO, Vec3::splat(0.5)));
        let p = shape_penetration(&a, &b).unwrap();
        assert_eq!(p.normal, Vec3::Y);
        assert!((p.depth - 0.2).abs() < 1e-6);

        let flipped = shape_penetration(&b, &a).unwrap();
        assert_eq!(flipped.normal, Vec3::NEG_Y);
    }

    #[test]
    fn test_box_sphere_penetration_flips_normal() {
        let ball = WorldShape::Sphere { center: Vec3::new(0.0, 1.25, 0.0), radius: 0.5 };
        let cube = WorldShape::Box(Obb::axis_aligned(Vec3::ZERO, Vec3::ONE));
        let p = shape_penetration(&cube, &ball).unwrap();
        assert!((p.normal - Vec3::NEG_Y).length() < 1e-6);
    }
}
