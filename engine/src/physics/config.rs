//! Physics Configuration
//!
//! Centralized tunables for the physics world. `Default` returns the values
//! the simulation was tuned with; any field may be overridden from JSON, and
//! omitted fields keep their defaults.
//!
//! # Example
//!
//! ```ignore
//! use tumble_engine::physics::PhysicsConfig;
//!
//! let config = PhysicsConfig::from_json_str(r#"{ "gravity": [0.0, -9.81, 0.0] }"#)?;
//! assert_eq!(config.sleep.time_threshold, 0.3);
//! ```

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Thresholds controlling when resting dynamic bodies fall asleep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    /// Linear speed below which a body counts as resting (m/s)
    pub velocity_threshold: f32,
    /// Angular speed below which a body counts as resting (deg/s)
    pub angular_threshold: f32,
    /// Seconds a body must rest before it sleeps
    pub time_threshold: f32,
    /// Velocity multiplier applied every tick while a body is resting
    pub damp_factor: f32,
    /// Collisions faster than `velocity_threshold * wake_speed_multiplier` wake both bodies
    pub wake_speed_multiplier: f32,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 0.3,
            angular_threshold: 1.0,
            time_threshold: 0.3,
            damp_factor: 0.9,
            wake_speed_multiplier: 2.0,
        }
    }
}

/// Empirical constants of the collision response.
///
/// The torque scales are not physically derived; they were tuned so boxes
/// and balls tumble plausibly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseTuning {
    /// Torque multiplier for box-box contacts
    pub box_torque_scale: f32,
    /// Torque multiplier for contacts involving a sphere
    pub sphere_torque_scale: f32,
    /// Torque multiplier for contacts against mesh colliders
    pub mesh_torque_scale: f32,
    /// Relative speed below which a contact is treated as resting (m/s)
    pub resting_speed: f32,
    /// Penetration below which a contact is treated as resting (m)
    pub resting_penetration: f32,
    /// Speeds below this are snapped to zero in resting contacts (m/s)
    pub resting_snap_speed: f32,
    /// Contact normals with a Y component above this count as ground
    pub ground_normal_y: f32,
    /// Fraction of friction applied to X/Z spin on ground contacts
    pub ground_spin_friction: f32,
}

impl Default for ResponseTuning {
    fn default() -> Self {
        Self {
            box_torque_scale: 500.0,
            sphere_torque_scale: 50.0,
            mesh_torque_scale: 30.0,
            resting_speed: 0.5,
            resting_penetration: 0.1,
            resting_snap_speed: 0.1,
            ground_normal_y: 0.5,
            ground_spin_friction: 0.5,
        }
    }
}

/// Top-level physics world configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration (m/s²)
    pub gravity: Vec3,
    /// Dynamic body count at which an attached GPU broad phase takes over
    pub gpu_broad_phase_threshold: usize,
    /// Maximum spheres uploaded to the GPU per detection
    pub max_gpu_objects: usize,
    /// Pair capacity per uploaded object
    pub gpu_pairs_per_object: usize,
    pub sleep: SleepConfig,
    pub response: ResponseTuning,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -20.0, 0.0),
            gpu_broad_phase_threshold: 750,
            max_gpu_objects: 50_000,
            gpu_pairs_per_object: 20,
            sleep: SleepConfig::default(),
            response: ResponseTuning::default(),
        }
    }
}

impl PhysicsConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// GPU pair buffer capacity.
    pub fn max_gpu_pairs(&self) -> usize {
        self.max_gpu_objects * self.gpu_pairs_per_object
    }
}
