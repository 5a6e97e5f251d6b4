//! GPU Broad Phase
//!
//! Sphere-vs-sphere culling on the GPU. Buffers, bind group and pipeline are
//! created once, sized for the capacities given at construction, and reused
//! by every [`GpuBroadPhase::detect_pairs`] call.
//!
//! Bindings (group 0):
//! - 0: uniform Params
//! - 1: storage<read> spheres
//! - 2: storage<read_write> pairs
//! - 3: storage<read_write> atomic pair counter
//!
//! # Example
//!
//! ```ignore
//! use tumble_engine::compute::GpuBroadPhase;
//! use tumble_engine::physics::broadphase::BroadPhaseSphere;
//!
//! let mut gpu = GpuBroadPhase::new(50_000, 1_000_000)?;
//! let pairs = gpu.detect_pairs(&spheres)?;
//! ```

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::context::ComputeContext;
use super::readback::map_read_blocking;
use super::ComputeError;
use crate::physics::broadphase::{BroadPhaseSphere, CollisionPair};

/// WGSL source of the culling kernel.
pub const BROADPHASE_SHADER: &str = include_str!("../../../shaders/broadphase.wgsl");

/// Invocations per workgroup, matches `@workgroup_size` in the shader.
pub const WORKGROUP_SIZE: u32 = 256;

/// Uniform parameters (16 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
struct Params {
    object_count: u32,
    max_pairs: u32,
    _pad0: u32,
    _pad1: u32,
}

static_assertions::assert_eq_size!(Params, [u8; 16]);

const SPHERE_SIZE: u64 = std::mem::size_of::<BroadPhaseSphere>() as u64;
const PAIR_SIZE: u64 = std::mem::size_of::<CollisionPair>() as u64;
const COUNT_SIZE: u64 = std::mem::size_of::<u32>() as u64;

fn check_capacity(max_objects: usize, max_pairs: usize) -> Result<(), ComputeError> {
    let fits = |n: usize| n > 0 && u32::try_from(n).is_ok();
    if fits(max_objects) && fits(max_pairs) {
        Ok(())
    } else {
        Err(ComputeError::InvalidCapacity { max_objects, max_pairs })
    }
}

pub struct GpuBroadPhase {
    ctx: ComputeContext,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    params_buffer: wgpu::Buffer,
    sphere_buffer: wgpu::Buffer,
    pair_buffer: wgpu::Buffer,
    count_buffer: wgpu::Buffer,
    pair_staging: wgpu::Buffer,
    count_staging: wgpu::Buffer,
    max_objects: usize,
    max_pairs: usize,
    last_reported_count: u32,
}

impl GpuBroadPhase {
    /// Acquire a device and build the broad phase.
    ///
    /// # Errors
    /// Any [`ComputeError`] from device acquisition, or
    /// [`ComputeError::InvalidCapacity`] when either capacity is zero.
    pub fn new(max_objects: usize, max_pairs: usize) -> Result<Self, ComputeError> {
        check_capacity(max_objects, max_pairs)?;
        Self::with_context(ComputeContext::new()?, max_objects, max_pairs)
    }

    pub fn with_context(ctx: ComputeContext, max_objects: usize, max_pairs: usize) -> Result<Self, ComputeError> {
        check_capacity(max_objects, max_pairs)?;

        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("broadphase_shader"),
            source: wgpu::ShaderSource::Wgsl(BROADPHASE_SHADER.into()),
        });

        // --- Buffers ---
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("broadphase_params"),
            contents: bytemuck::bytes_of(&Params::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sphere_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("broadphase_spheres"),
            size: max_objects as u64 * SPHERE_SIZE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let pair_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("broadphase_pairs"),
            size: max_pairs as u64 * PAIR_SIZE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let count_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("broadphase_pair_count"),
            size: COUNT_SIZE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let pair_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("broadphase_pairs_staging"),
            size: max_pairs as u64 * PAIR_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let count_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("broadphase_pair_count_staging"),
            size: COUNT_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // --- Layout ---
        let storage_entry = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("broadphase_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<Params>() as u64),
                    },
                    count: None,
                },
                storage_entry(1, true),
                storage_entry(2, false),
                storage_entry(3, false),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("broadphase_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: sphere_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: pair_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: count_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("broadphase_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("broadphase_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        log::info!(
            "GPU broad phase ready ({} objects, {} pairs)",
            max_objects,
            max_pairs
        );

        Ok(Self {
            ctx,
            pipeline,
            bind_group,
            params_buffer,
            sphere_buffer,
            pair_buffer,
            count_buffer,
            pair_staging,
            count_staging,
            max_objects,
            max_pairs,
            last_reported_count: 0,
        })
    }

    pub fn max_objects(&self) -> usize {
        self.max_objects
    }

    pub fn max_pairs(&self) -> usize {
        self.max_pairs
    }

    /// Overlap count the shader reported on the last call, including pairs
    /// dropped for lack of capacity.
    pub fn last_reported_count(&self) -> u32 {
        self.last_reported_count
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.ctx.adapter_info
    }

    /// Find every overlapping pair among `spheres`.
    ///
    /// Blocks until the GPU is done. Pairs come back with `a < b`, sorted.
    /// Inputs beyond `max_objects` are ignored with a warning; overlaps beyond
    /// `max_pairs` are dropped from the result but still counted in
    /// [`last_reported_count`](Self::last_reported_count).
    pub fn detect_pairs(&mut self, spheres: &[BroadPhaseSphere]) -> Result<Vec<CollisionPair>, ComputeError> {
        let spheres = if spheres.len() > self.max_objects {
            log::warn!(
                "GPU broad phase: {} spheres exceed capacity {}, truncating",
                spheres.len(),
                self.max_objects
            );
            &spheres[..self.max_objects]
        } else {
            spheres
        };

        if spheres.len() < 2 {
            self.last_reported_count = 0;
            return Ok(Vec::new());
        }

        let object_count = spheres.len() as u32;
        let params = Params {
            object_count,
            max_pairs: self.max_pairs as u32,
            _pad0: 0,
            _pad1: 0,
        };

        let queue = &self.ctx.queue;
        let device = &self.ctx.device;
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
        queue.write_buffer(&self.sphere_buffer, 0, bytemuck::cast_slice(spheres));

        // Dispatch and fetch the counter
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("broadphase_encoder"),
        });
        encoder.clear_buffer(&self.count_buffer, 0, None);
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("broadphase_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups(object_count.div_ceil(WORKGROUP_SIZE), 1, 1);
        }
        encoder.copy_buffer_to_buffer(&self.count_buffer, 0, &self.count_staging, 0, COUNT_SIZE);
        queue.submit(Some(encoder.finish()));

        let count_bytes = map_read_blocking(device, &self.count_staging, COUNT_SIZE)?;
        let reported = count_bytes
            .get(..4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .unwrap_or(0);
        self.last_reported_count = reported;

        let stored = (reported as usize).min(self.max_pairs);
        if reported as usize > self.max_pairs {
            log::warn!(
                "GPU broad phase: {} overlaps exceed pair capacity {}, {} dropped",
                reported,
                self.max_pairs,
                reported as usize - self.max_pairs
            );
        }
        if stored == 0 {
            return Ok(Vec::new());
        }

        // Fetch only the written prefix of the pair buffer
        let pair_bytes = stored as u64 * PAIR_SIZE;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("broadphase_readback_encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.pair_buffer, 0, &self.pair_staging, 0, pair_bytes);
        queue.submit(Some(encoder.finish()));

        let bytes = map_read_blocking(device, &self.pair_staging, pair_bytes)?;
        let mut pairs: Vec<CollisionPair> = bytes
            .chunks_exact(PAIR_SIZE as usize)
            .map(|chunk| bytemuck::pod_read_unaligned::<CollisionPair>(chunk).normalized())
            .collect();
        pairs.sort_unstable();
        Ok(pairs)
    }
}
