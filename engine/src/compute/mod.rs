//! GPU compute
//!
//! Headless wgpu plumbing for the physics world. Nothing in here is required
//! for simulation: when no adapter or device can be acquired the errors below
//! surface and the caller keeps using the CPU paths.
//!
//! # Submodules
//!
//! - [`context`] - Headless device and queue
//! - [`readback`] - Buffer map and copy back to the host
//! - [`broadphase`] - Sphere-vs-sphere pair culling

pub mod broadphase;
pub mod context;
pub mod readback;

pub use broadphase::{BROADPHASE_SHADER, GpuBroadPhase};
pub use context::{ComputeContext, ComputeContextConfig};

use thiserror::Error;

/// Why the GPU path could not be used.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("compute unavailable: no GPU adapter ({0})")]
    AdapterUnavailable(#[from] wgpu::RequestAdapterError),
    #[error("compute unavailable: device request failed ({0})")]
    DeviceUnavailable(#[from] wgpu::RequestDeviceError),
    #[error("invalid broad phase capacity: {max_objects} objects, {max_pairs} pairs")]
    InvalidCapacity { max_objects: usize, max_pairs: usize },
    #[error("buffer map failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),
    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("readback callback dropped before completion")]
    ReadbackCancelled,
}
