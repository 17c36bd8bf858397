use crate::foundation::error::{AlphaError, AlphaResult};

/// Adapter selection preferences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GpuOptions {
    /// Prefer the discrete GPU over an integrated one.
    pub high_performance: bool,
    /// Only accept a software/fallback adapter.
    pub force_fallback_adapter: bool,
}

impl Default for GpuOptions {
    fn default() -> Self {
        Self {
            high_performance: true,
            force_fallback_adapter: false,
        }
    }
}

/// Device and queue owned by one renderer session.
#[derive(Clone, Debug)]
pub struct GpuContext {
    /// Logical device.
    pub device: wgpu::Device,
    /// Submission queue of `device`.
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Request a headless adapter and device.
    ///
    /// Fails with [`AlphaError::ContextUnavailable`] when no adapter or device can be
    /// obtained.
    #[tracing::instrument]
    pub fn request(opts: &GpuOptions) -> AlphaResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let power_preference = if opts.high_performance {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: None,
            force_fallback_adapter: opts.force_fallback_adapter,
        }))
        .map_err(|e| AlphaError::context_unavailable(format!("no gpu adapter available: {e}")))?;

        let info = adapter.get_info();
        tracing::debug!(name = %info.name, backend = ?info.backend, "gpu adapter selected");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("alphaframe_device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| AlphaError::context_unavailable(format!("request_device failed: {e}")))?;

        Ok(Self { device, queue })
    }

    /// Wrap an existing device/queue pair, e.g. one shared with an application renderer.
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Block until previously submitted work is done.
    pub fn wait_idle(&self) -> AlphaResult<()> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| AlphaError::gpu(format!("wgpu poll failed: {e:?}")))?;
        Ok(())
    }
}
