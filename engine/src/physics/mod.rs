//! Physics module
//!
//! Rigidbody dynamics and collision for a small number of simultaneous
//! dynamic bodies, plus an optional GPU broad phase for large sphere sets.
//! No external physics library is involved.
//!
//! # Unit System
//!
//! **1 unit = 1 meter** (SI units throughout)
//!
//! - Distances in meters
//! - Velocities in m/s
//! - Accelerations in m/s²
//! - Mass in kg
//! - Rotations and angular velocities in degrees (Euler XYZ)
//!
//! # Submodules
//!
//! - [`types`] - Core mathematical types (Vec3, Quat, Mat3) re-exported from glam
//! - [`transform`] - Position, Euler rotation and scale with a cached quaternion
//! - [`aabb`], [`obb`], [`triangle`], [`bvh`] - Geometry primitives
//! - [`collider`] - Sphere, box and baked mesh colliders
//! - [`rigidbody`], [`integrator`] - Body state and the per-tick integration
//! - [`broadphase`] - Bounding-sphere packing and the CPU pair sweep
//! - [`resolver`], [`contact`] - Narrow phase, response and contact events
//! - [`world`] - Object registry and the simulation tick
//! - [`raycast`] - Ray queries against boxes and spheres
//! - [`character`] - Stepped character controller
//! - [`config`], [`error`] - Tunables and error types

pub mod aabb;
pub mod broadphase;
pub mod bvh;
pub mod character;
pub mod collider;
pub mod config;
pub mod contact;
pub mod error;
pub mod integrator;
pub mod obb;
pub mod raycast;
pub mod resolver;
pub mod rigidbody;
pub mod transform;
pub mod triangle;
pub mod types;
pub mod world;

// Re-export commonly used types at the physics module level
pub use aabb::Aabb;
pub use broadphase::{BroadPhaseSphere, CollisionPair, detect_pairs_cpu};
pub use bvh::Bvh;
pub use character::{CharacterConfig, CharacterController};
pub use collider::{Collider, MeshCollider, WorldShape};
pub use config::{PhysicsConfig, ResponseTuning, SleepConfig};
pub use contact::{CollisionHandler, ContactEvent, ContactKind};
pub use error::{ConfigError, PhysicsError};
pub use obb::{Obb, Penetration};
pub use raycast::{RaycastHit, aabb_surface_normal, ray_aabb_intersect};
pub use rigidbody::RigidBody;
pub use transform::Transform;
pub use triangle::Triangle;
pub use types::{Quat, Vec3};
pub use world::{BodyHandle, BodyKind, PhysicsObject, PhysicsWorld};
