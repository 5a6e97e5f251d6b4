//! Tumble Engine Library
//!
//! Physics and collision core for real-time 3D simulation: rigidbody
//! integration, SAT box tests, sphere and mesh contacts, impulse response
//! with contact events, a stepped character controller and ray queries.
//!
//! # Modules
//!
//! - [`physics`] - Geometry, bodies, the physics world and its queries
//! - [`compute`] - Optional wgpu compute broad phase
//!
//! # Example
//!
//! ```ignore
//! use tumble_engine::physics::{Collider, PhysicsObject, PhysicsWorld, RigidBody, Transform};
//! use glam::Vec3;
//!
//! let mut world = PhysicsWorld::default();
//!
//! // Optional: cull dynamic pairs on the GPU once there are enough of them
//! if let Err(err) = world.init_gpu_broad_phase() {
//!     log::warn!("Staying on the CPU broad phase: {}", err);
//! }
//!
//! let crate_box = world.add(
//!     PhysicsObject::new("crate")
//!         .with_transform(Transform::from_position(Vec3::new(0.0, 4.0, 0.0)))
//!         .with_rigidbody(RigidBody::new(2.0))
//!         .with_collider(Collider::cuboid(Vec3::splat(0.5))),
//! )?;
//!
//! // Each frame:
//! world.update(delta_time);
//! for event in world.drain_contact_events() {
//!     // ...
//! }
//! ```

pub mod compute;
pub mod physics;

// Re-export the most used physics types at crate level for convenience
pub use physics::{BodyHandle, Collider, PhysicsConfig, PhysicsObject, PhysicsWorld, RigidBody, Transform};
