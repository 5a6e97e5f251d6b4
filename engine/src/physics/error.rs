//! Physics error types
//!
//! Registration and configuration are the only fallible entry points of the
//! physics core. Per-pair resolution never fails: a pair that lacks the
//! components needed to interact is simply skipped.

use thiserror::Error;

/// Errors raised when an object is registered with a [`PhysicsWorld`](super::PhysicsWorld).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    /// A dynamic or kinematic body must carry a finite, strictly positive mass.
    #[error("rigidbody mass must be finite and positive, got {mass}")]
    InvalidMass { mass: f32 },

    /// Mesh colliders are baked once in world space and cannot follow a moving body.
    #[error("mesh collider on '{name}' is static-only and cannot be combined with a rigidbody")]
    MovingMeshCollider { name: String },
}

/// Errors raised while loading a [`PhysicsConfig`](super::PhysicsConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read physics config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse physics config: {0}")]
    Json(#[from] serde_json::Error),
}
