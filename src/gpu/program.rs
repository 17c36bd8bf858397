use crate::{
    foundation::error::{AlphaError, AlphaResult},
    gpu::{
        context::GpuContext,
        geometry::QuadVertex,
        shader::{
            FRAGMENT_ENTRY, PLACEMENTS_BINDING, SAMPLER_BINDING, ShaderVariantCache,
            VERTEX_ENTRY, VERTEX_SHADER, VIDEO_TEXTURE_BINDING, overlay_binding, placement_slots,
            validate_wgsl,
        },
        target::TARGET_FORMAT,
    },
};

/// Compiled program for one overlay-source count.
#[derive(Debug)]
pub(crate) struct ShaderProgram {
    pub(crate) source_count: usize,
    pub(crate) generation: u64,
    pub(crate) bind_group_layout: wgpu::BindGroupLayout,
    pub(crate) pipeline: wgpu::RenderPipeline,
    /// Backing store of the placement array; `None` when `source_count == 0`.
    pub(crate) placements: Option<wgpu::Buffer>,
    _fragment: wgpu::ShaderModule,
}

impl ShaderProgram {
    fn release(self) {
        if let Some(buf) = &self.placements {
            buf.destroy();
        }
    }
}

/// Compiled programs for a session, rebuilt only when the overlay-source count changes.
///
/// The vertex module is compiled once and shared by every variant. A failed build
/// leaves the previously active program untouched.
#[derive(Debug, Default)]
pub(crate) struct ProgramCache {
    sources: ShaderVariantCache,
    vertex: Option<wgpu::ShaderModule>,
    active: Option<ShaderProgram>,
    builds: u64,
}

impl ProgramCache {
    pub(crate) fn active(&self) -> Option<&ShaderProgram> {
        self.active.as_ref()
    }

    /// Ensure the active program serves `source_count` overlay sources.
    #[tracing::instrument(skip(self, ctx))]
    pub(crate) fn build(
        &mut self,
        ctx: &GpuContext,
        source_count: usize,
    ) -> AlphaResult<&ShaderProgram> {
        let reuse = self
            .active
            .as_ref()
            .is_some_and(|p| p.source_count == source_count);
        if !reuse {
            let program = self.compile(ctx, source_count)?;
            if let Some(old) = self.active.replace(program) {
                tracing::debug!(
                    old = old.source_count,
                    new = source_count,
                    "released program for previous source count"
                );
                old.release();
            }
        }
        self.active
            .as_ref()
            .ok_or_else(|| AlphaError::invalid_state("no active program"))
    }

    fn compile(&mut self, ctx: &GpuContext, source_count: usize) -> AlphaResult<ShaderProgram> {
        let max_textures = ctx.device.limits().max_sampled_textures_per_shader_stage as usize;
        if source_count + 1 > max_textures {
            return Err(AlphaError::shader_compile(format!(
                "{source_count} overlay sources exceed the device limit of {} sampled textures",
                max_textures
            )));
        }

        let fragment_src = self.sources.fragment(source_count)?;
        let device = &ctx.device;

        if self.vertex.is_none() {
            validate_wgsl(VERTEX_SHADER)?;
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        if self.vertex.is_none() {
            self.vertex = Some(device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("alphaframe_vertex"),
                source: wgpu::ShaderSource::Wgsl(VERTEX_SHADER.into()),
            }));
        }
        let vertex = self
            .vertex
            .as_ref()
            .ok_or_else(|| AlphaError::invalid_state("vertex module missing"))?;

        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("alphaframe_fragment"),
            source: wgpu::ShaderSource::Wgsl(fragment_src.as_ref().into()),
        });

        let entries = layout_entries(source_count);
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("alphaframe_bgl"),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("alphaframe_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("alphaframe_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: vertex,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[QuadVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let placements = (source_count > 0).then(|| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("alphaframe_placements"),
                size: (placement_slots(source_count) * 16) as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            if let Some(buf) = &placements {
                buf.destroy();
            }
            return Err(AlphaError::shader_compile(err.to_string()));
        }

        self.builds += 1;
        tracing::debug!(source_count, generation = self.builds, "program built");
        Ok(ShaderProgram {
            source_count,
            generation: self.builds,
            bind_group_layout,
            pipeline,
            placements,
            _fragment: fragment,
        })
    }

    /// Release every GPU object held by the cache.
    pub(crate) fn release(&mut self) {
        if let Some(program) = self.active.take() {
            program.release();
        }
        self.vertex = None;
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

fn layout_entries(source_count: usize) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(source_count + 3);
    entries.push(texture_entry(VIDEO_TEXTURE_BINDING));
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: SAMPLER_BINDING,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });
    if source_count > 0 {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: PLACEMENTS_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new((placement_slots(source_count) * 16) as u64),
            },
            count: None,
        });
        for unit in 1..=source_count as u32 {
            entries.push(texture_entry(overlay_binding(unit)));
        }
    }
    entries
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/program.rs"]
mod tests;
