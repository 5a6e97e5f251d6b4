//! Character Controller
//!
//! Stepped kinematic mover for player-like characters. The character is an
//! upright box (`2 * radius` wide, `height` tall) centred on its transform
//! position; it never takes part in impulse resolution, it only pushes itself
//! out of the boxes around it.
//!
//! # Movement Model
//!
//! - Motion is split into a horizontal (XZ) and a vertical (Y) sub-move so a
//!   diagonal step cannot slip through a corner.
//! - A horizontal-only push-out against an obstacle whose top is within
//!   `step_height` of the feet snaps the character on top of it, provided the
//!   raised volume is clear.
//! - An upward push lands the character: `grounded` is set and vertical
//!   velocity is zeroed. A downward sub-move that ends within
//!   `STEP_CLEARANCE` above a surface settles onto it the same way, so the
//!   gap left by a step-up does not read as airborne.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tumble_engine::physics::{CharacterController, CharacterConfig, PhysicsWorld};
//! use glam::Vec3;
//!
//! let mut controller = CharacterController::new(CharacterConfig::default());
//!
//! // Each frame:
//! controller.simple_move(&mut world, player, input_dir * 5.0, delta_time);
//! ```

use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::collider::Collider;
use super::types::Vec3;
use super::world::{BodyHandle, PhysicsWorld};

/// Clearance added above the obstacle top when stepping up
const STEP_CLEARANCE: f32 = 0.01;

/// Downward speed applied while grounded so the floor keeps pushing back
const GROUND_STICK_SPEED: f32 = 0.1;

/// Character dimensions and movement constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Full height in meters
    pub height: f32,
    /// Horizontal half-width in meters
    pub radius: f32,
    /// Highest ledge the character walks onto without jumping
    pub step_height: f32,
    /// Gravity acceleration in m/s² (positive, pulls down)
    pub gravity: f32,
    pub use_gravity: bool,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            height: 1.8,
            radius: 0.4,
            step_height: 0.4,
            gravity: 20.0,
            use_gravity: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CharacterController {
    pub config: CharacterConfig,
    /// Current velocity; only the Y component is integrated by the controller
    pub velocity: Vec3,
    grounded: bool,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::new(CharacterConfig::default())
    }
}

impl CharacterController {
    pub fn new(config: CharacterConfig) -> Self {
        Self {
            config,
            velocity: Vec3::ZERO,
            grounded: false,
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Launch upwards if standing on something.
    ///
    /// # Returns
    /// `true` if the jump happened
    pub fn jump(&mut self, speed: f32) -> bool {
        if !self.grounded {
            return false;
        }
        self.velocity.y = speed;
        self.grounded = false;
        true
    }

    /// Box occupied by the character when centred at `position`.
    pub fn bounds_at(&self, position: Vec3) -> Aabb {
        Aabb::from_center_half_extents(
            position,
            Vec3::new(self.config.radius, self.config.height * 0.5, self.config.radius),
        )
    }

    /// Moves the character by `motion` against every collider in the world.
    ///
    /// # Returns
    /// The displacement actually applied, or zero if `handle` is not in the world
    pub fn move_by(&mut self, world: &mut PhysicsWorld, handle: BodyHandle, motion: Vec3) -> Vec3 {
        let Some(start) = world.transform(handle).map(|t| t.position) else {
            return Vec3::ZERO;
        };
        let obstacles = collect_obstacles(world, handle);

        let mut position = start;
        let horizontal = Vec3::new(motion.x, 0.0, motion.z);
        if horizontal != Vec3::ZERO {
            position = self.sub_move(position, horizontal, &obstacles);
        }
        if motion.y != 0.0 {
            position = self.sub_move(position, Vec3::new(0.0, motion.y, 0.0), &obstacles);
        }

        if let Some(transform) = world.transform_mut(handle) {
            transform.position = position;
        }
        position - start
    }

    /// Applies `horizontal_velocity` for `dt` plus the controller's own
    /// vertical velocity under gravity.
    ///
    /// `grounded` is cleared before the move and set again only if the move
    /// lands or steps.
    pub fn simple_move(
        &mut self,
        world: &mut PhysicsWorld,
        handle: BodyHandle,
        horizontal_velocity: Vec3,
        dt: f32,
    ) -> Vec3 {
        if self.grounded && self.velocity.y <= 0.0 {
            self.velocity.y = -GROUND_STICK_SPEED;
        } else if self.config.use_gravity {
            self.velocity.y -= self.config.gravity * dt;
        }

        let motion = Vec3::new(horizontal_velocity.x, self.velocity.y, horizontal_velocity.z) * dt;
        self.grounded = false;
        self.move_by(world, handle, motion)
    }

    fn sub_move(&mut self, from: Vec3, motion: Vec3, obstacles: &[Aabb]) -> Vec3 {
        let mut position = from + motion;

        for obstacle in obstacles {
            let bounds = self.bounds_at(position);
            let push = bounds.resolve(obstacle);
            if push == Vec3::ZERO {
                continue;
            }

            if push.y == 0.0 && motion.y == 0.0 {
                if let Some(stepped) = self.try_step(position, obstacle, obstacles) {
                    position = stepped;
                    self.grounded = true;
                    self.velocity.y = self.velocity.y.max(0.0);
                    continue;
                }
            }

            position += push;
            if push.y > 0.0 {
                self.grounded = true;
                self.velocity.y = 0.0;
            }
        }

        if motion.y < 0.0 {
            if let Some(top) = self.ground_below(position, obstacles) {
                position.y += top - (position.y - self.config.height * 0.5);
                self.grounded = true;
                self.velocity.y = 0.0;
            }
        }

        position
    }

    /// Top of the highest obstacle under the footprint whose surface is at
    /// most `STEP_CLEARANCE` below the feet.
    fn ground_below(&self, position: Vec3, obstacles: &[Aabb]) -> Option<f32> {
        let bounds = self.bounds_at(position);
        let feet = bounds.min.y;
        obstacles
            .iter()
            .filter(|o| {
                bounds.min.x < o.max.x
                    && bounds.max.x > o.min.x
                    && bounds.min.z < o.max.z
                    && bounds.max.z > o.min.z
            })
            .map(|o| o.max.y)
            .filter(|&top| top <= feet && feet - top <= STEP_CLEARANCE)
            .reduce(f32::max)
    }

    /// Position on top of `obstacle` if it is low enough and the raised
    /// volume is clear of every obstacle.
    fn try_step(&self, position: Vec3, obstacle: &Aabb, obstacles: &[Aabb]) -> Option<Vec3> {
        let feet = position.y - self.config.height * 0.5;
        let rise = obstacle.max.y - feet;
        if rise <= 0.0 || rise > self.config.step_height {
            return None;
        }

        let raised = Vec3::new(position.x, position.y + rise + STEP_CLEARANCE, position.z);
        let test = self.bounds_at(raised);
        if obstacles.iter().any(|o| test.intersects(o)) {
            return None;
        }
        Some(raised)
    }
}

/// World boxes of every sphere and box collider except the character's own.
fn collect_obstacles(world: &PhysicsWorld, me: BodyHandle) -> Vec<Aabb> {
    world
        .collidable_objects()
        .into_iter()
        .filter(|&h| h != me)
        .filter_map(|h| {
            let object = world.get(h)?;
            match object.collider.as_ref()? {
                Collider::Mesh(_) => None,
                collider => Some(collider.world_aabb(&object.transform)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::transform::Transform;
    use crate::physics::world::PhysicsObject;

    fn world_with_floor() -> PhysicsWorld {
        let mut world = PhysicsWorld::default();
        world
            .add(
                PhysicsObject::new("floor")
                    .with_transform(Transform::from_position(Vec3::new(0.0, -0.5, 0.0)))
                    .with_collider(Collider::cuboid(Vec3::new(10.0, 0.5, 10.0))),
            )
            .unwrap();
        world
    }

    fn spawn_character(world: &mut PhysicsWorld, position: Vec3) -> BodyHandle {
        world
            .add(PhysicsObject::new("player").with_transform(Transform::from_position(position)))
            .unwrap()
    }

    #[test]
    fn test_falls_and_lands_on_floor() {
        let mut world = world_with_floor();
        let player = spawn_character(&mut world, Vec3::new(0.0, 3.0, 0.0));
        let mut controller = CharacterController::default();

        for _ in 0..120 {
            controller.simple_move(&mut world, player, Vec3::ZERO, 1.0 / 60.0);
        }

        let y = world.transform(player).unwrap().position.y;
        assert!(controller.is_grounded());
        assert!((y - 0.9).abs() < 0.01, "Expected to stand at y=0.9, got y={}", y);
    }

    #[test]
    fn test_walks_into_wall_and_stops() {
        let mut world = world_with_floor();
        world
            .add(
                PhysicsObject::new("wall")
                    .with_transform(Transform::from_position(Vec3::new(2.0, 1.0, 0.0)))
                    .with_collider(Collider::cuboid(Vec3::new(0.5, 1.0, 2.0))),
            )
            .unwrap();
        let player = spawn_character(&mut world, Vec3::new(0.0, 0.9, 0.0));
        let mut controller = CharacterController::default();

        for _ in 0..60 {
            controller.move_by(&mut world, player, Vec3::new(0.1, 0.0, 0.0));
        }

        let x = world.transform(player).unwrap().position.x;
        assert!((x - 1.1).abs() < 1e-4, "Expected to stop at x=1.1, got x={}", x);
    }

    #[test]
    fn test_jump_requires_ground() {
        let mut controller = CharacterController::default();
        assert!(!controller.jump(8.0));
        controller.grounded = true;
        assert!(controller.jump(8.0));
        assert_eq!(controller.velocity.y, 8.0);
        assert!(!controller.is_grounded());
    }

    #[test]
    fn test_missing_handle_is_noop() {
        let mut world = world_with_floor();
        let player = spawn_character(&mut world, Vec3::new(0.0, 0.9, 0.0));
        world.remove(player);
        let mut controller = CharacterController::default();
        assert_eq!(controller.move_by(&mut world, player, Vec3::X), Vec3::ZERO);
    }
}
