//! Rigidbody integration
//!
//! Advances one dynamic body by one tick, before any contact is resolved.
//! The integrator knows nothing about collisions.

use super::config::PhysicsConfig;
use super::rigidbody::RigidBody;
use super::transform::Transform;
use super::types::Vec3;

/// What happened to a body during integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyState {
    /// Sleeping bodies are not touched.
    Skipped,
    Moving,
    /// The body came to rest and fell asleep this tick.
    FellAsleep,
}

/// Integrate a dynamic body over a time step.
///
/// Semi-implicit Euler:
/// - velocity += (gravity + support_force / mass) * dt
/// - position += velocity * dt
/// - rotation += angular_velocity * dt (degrees)
/// - angular_velocity *= 1 - (1 - angular_damping) * dt * 60
///
/// `support_force` is the upward normal force synthesised by resting
/// contacts on the previous tick.
///
/// # Arguments
/// * `transform` - Body transform, updated in place
/// * `body` - Rigidbody state, updated in place
/// * `support_force` - Carried-over contact force (N)
/// * `config` - Gravity and sleep thresholds
/// * `dt` - Time step in seconds
pub fn integrate(
    transform: &mut Transform,
    body: &mut RigidBody,
    support_force: Vec3,
    config: &PhysicsConfig,
    dt: f32,
) -> BodyState {
    if body.is_sleeping() {
        return BodyState::Skipped;
    }

    let mut acceleration = support_force * body.inverse_mass();
    if body.use_gravity {
        acceleration += config.gravity;
    }
    body.velocity += acceleration * dt;
    transform.position += body.velocity * dt;

    if body.angular_velocity != Vec3::ZERO {
        transform.rotate_by(body.angular_velocity * dt);
        let keep = (1.0 - (1.0 - body.angular_damping) * dt * 60.0).max(0.0);
        body.angular_velocity *= keep;
    }

    if body.update_sleep(dt, &config.sleep) {
        BodyState::FellAsleep
    } else {
        BodyState::Moving
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_fall_matches_semi_implicit_euler() {
        let config = PhysicsConfig::default();
        let mut t = Transform::from_position(Vec3::new(0.0, 10.0, 0.0));
        let mut rb = RigidBody::default();
        let dt = 0.1;

        integrate(&mut t, &mut rb, Vec3::ZERO, &config, dt);
        assert!((rb.velocity.y + 2.0).abs() < 1e-5, "vy = {}", rb.velocity.y);
        assert!((t.position.y - 9.8).abs() < 1e-5, "y = {}", t.position.y);

        integrate(&mut t, &mut rb, Vec3::ZERO, &config, dt);
        assert!((rb.velocity.y + 4.0).abs() < 1e-5);
        assert!((t.position.y - 9.4).abs() < 1e-5);
    }

    #[test]
    fn test_support_force_cancels_gravity() {
        let config = PhysicsConfig::default();
        let mut t = Transform::default();
        let mut rb = RigidBody::new(2.0).with_velocity(Vec3::new(1.0, 0.0, 0.0));
        let support = -config.gravity * rb.mass;
        integrate(&mut t, &mut rb, support, &config, 1.0 / 60.0);
        assert!(rb.velocity.y.abs() < 1e-6);
    }

    #[test]
    fn test_angular_velocity_rotates_and_damps() {
        let config = PhysicsConfig::default();
        let mut t = Transform::default();
        let mut rb = RigidBody::default().with_gravity(false);
        rb.angular_velocity = Vec3::new(0.0, 90.0, 0.0);

        integrate(&mut t, &mut rb, Vec3::ZERO, &config, 1.0 / 60.0);
        assert!((t.rotation().y - 1.5).abs() < 1e-4);
        assert!(t.is_orientation_dirty());
        // 1 - 0.02 * (1/60) * 60 = 0.98
        assert!((rb.angular_velocity.y - 88.2).abs() < 1e-3);
    }

    #[test]
    fn test_sleeping_body_is_skipped() {
        let config = PhysicsConfig::default();
        let mut t = Transform::default();
        let mut rb = RigidBody::default();
        rb.sleep();
        assert_eq!(integrate(&mut t, &mut rb, Vec3::ZERO, &config, 0.1), BodyState::Skipped);
        assert_eq!(t.position, Vec3::ZERO);
    }

    #[test]
    fn test_gravity_disabled() {
        let config = PhysicsConfig::default();
        let mut t = Transform::default();
        let mut rb = RigidBody::default().with_gravity(false).with_velocity(Vec3::X);
        integrate(&mut t, &mut rb, Vec3::ZERO, &config, 0.5);
        assert_eq!(t.position, Vec3::new(0.5, 0.0, 0.0));
    }
}
