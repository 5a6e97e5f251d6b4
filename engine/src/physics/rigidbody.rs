//! Rigidbody state
//!
//! Velocities, material and the sleep bookkeeping for one body. Angular
//! velocity is stored in degrees per second per axis, matching the Euler
//! rotation of [`Transform`](super::Transform).

use super::config::SleepConfig;
use super::error::PhysicsError;
use super::types::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    /// Linear velocity (m/s)
    pub velocity: Vec3,
    /// Angular velocity (degrees/s per axis)
    pub angular_velocity: Vec3,
    /// Mass (kg); must be finite and positive for registered bodies
    pub mass: f32,
    /// Restitution in [0, 1]
    pub bounciness: f32,
    /// Sliding friction in [0, 1]
    pub friction: f32,
    /// Fraction of angular velocity kept per 60 Hz frame
    pub angular_damping: f32,
    pub use_gravity: bool,
    /// Moved only by gameplay code; pushes dynamics but is never pushed
    pub is_kinematic: bool,
    is_sleeping: bool,
    sleep_timer: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: 1.0,
            bounciness: 0.5,
            friction: 0.1,
            angular_damping: 0.98,
            use_gravity: true,
            is_kinematic: false,
            is_sleeping: false,
            sleep_timer: 0.0,
        }
    }
}

impl RigidBody {
    pub fn new(mass: f32) -> Self {
        Self {
            mass,
            ..Default::default()
        }
    }

    /// A kinematic body: no gravity, moved only by gameplay code.
    pub fn kinematic() -> Self {
        Self {
            is_kinematic: true,
            use_gravity: false,
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = bounciness.clamp(0.0, 1.0);
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.clamp(0.0, 1.0);
        self
    }

    pub fn with_gravity(mut self, use_gravity: bool) -> Self {
        self.use_gravity = use_gravity;
        self
    }

    /// `1 / mass`, or zero (infinite mass) when the mass is not usable.
    pub fn inverse_mass(&self) -> f32 {
        if self.mass.is_finite() && self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Registration check: mass must be finite and strictly positive.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if self.mass.is_finite() && self.mass > 0.0 {
            Ok(())
        } else {
            Err(PhysicsError::InvalidMass { mass: self.mass })
        }
    }

    pub fn is_sleeping(&self) -> bool {
        self.is_sleeping
    }

    pub fn sleep_timer(&self) -> f32 {
        self.sleep_timer
    }

    pub fn wake(&mut self) {
        self.is_sleeping = false;
        self.sleep_timer = 0.0;
    }

    /// Puts the body to sleep immediately with zeroed velocities.
    pub fn sleep(&mut self) {
        self.is_sleeping = true;
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    /// Advances the rest timer after integration.
    ///
    /// While below both thresholds the body is damped and accumulates rest
    /// time; once the timer passes `time_threshold` it sleeps. Returns true
    /// on the tick the body falls asleep.
    pub fn update_sleep(&mut self, dt: f32, config: &SleepConfig) -> bool {
        if self.is_sleeping || self.is_kinematic {
            return false;
        }

        let resting = self.velocity.length() < config.velocity_threshold
            && self.angular_velocity.length() < config.angular_threshold;

        if !resting {
            self.sleep_timer = 0.0;
            return false;
        }

        self.sleep_timer += dt;
        self.velocity *= config.damp_factor;
        self.angular_velocity *= config.damp_factor;

        if self.sleep_timer >= config.time_threshold {
            self.sleep();
            return true;
        }
        false
    }
}
