//! Compute Context
//!
//! Headless device and queue for compute work. No window or surface is
//! involved, so this works on machines without a display as long as some
//! adapter (hardware or software) is present.

use super::ComputeError;

/// Configuration for compute context creation
#[derive(Clone, Debug)]
pub struct ComputeContextConfig {
    /// Prefer high-performance GPU
    pub high_performance: bool,
    /// Accept only a software fallback adapter
    pub force_fallback_adapter: bool,
}

impl Default for ComputeContextConfig {
    fn default() -> Self {
        Self {
            high_performance: true,
            force_fallback_adapter: false,
        }
    }
}

/// Shared compute resources
pub struct ComputeContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
}

impl ComputeContext {
    /// Create a compute context with default settings.
    ///
    /// # Errors
    /// [`ComputeError::AdapterUnavailable`] or [`ComputeError::DeviceUnavailable`]
    /// when no usable GPU is present. Callers fall back to the CPU path.
    pub fn new() -> Result<Self, ComputeError> {
        Self::with_config(ComputeContextConfig::default())
    }

    pub fn with_config(config: ComputeContextConfig) -> Result<Self, ComputeError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: if config.high_performance {
                wgpu::PowerPreference::HighPerformance
            } else {
                wgpu::PowerPreference::LowPower
            },
            compatible_surface: None,
            force_fallback_adapter: config.force_fallback_adapter,
        }))?;

        let adapter_info = adapter.get_info();

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Tumble Compute Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        }))?;

        log::info!(
            "Compute context ready: {} ({:?}, {:?})",
            adapter_info.name,
            adapter_info.device_type,
            adapter_info.backend
        );

        Ok(Self {
            device,
            queue,
            adapter_info,
        })
    }
}
