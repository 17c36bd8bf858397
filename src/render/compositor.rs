use crate::{
    descriptor::model::FrameDescriptor,
    foundation::error::{AlphaError, AlphaResult},
    gpu::{
        context::GpuContext,
        program::ShaderProgram,
        shader::{PLACEMENTS_BINDING, SAMPLER_BINDING, VIDEO_TEXTURE_BINDING, overlay_binding},
        textures::TextureManager,
    },
    render::session::{CachedBindGroup, Session},
};

impl Session {
    /// Composite one frame: pack and upload placements, refresh the video texture,
    /// draw the quad. Returns the number of placement records drawn.
    pub(crate) fn composite(
        &mut self,
        video: &image::RgbaImage,
        placements: Option<&FrameDescriptor>,
        clear_rgba: [f64; 4],
    ) -> AlphaResult<usize> {
        let program = self
            .programs
            .active()
            .ok_or_else(|| AlphaError::invalid_state("no program built"))?;
        let geometry = &self.geometry;

        let records = self
            .packer
            .pack(placements, &self.layout, self.textures.units())
            .len();
        if let (Some(bytes), Some(buffer)) = (self.packer.upload_bytes(), &program.placements) {
            self.ctx.queue.write_buffer(buffer, 0, bytes);
        }

        self.textures.upload_video(&self.ctx, video)?;

        let stale = self.bind_group.as_ref().is_none_or(|cached| {
            cached.program_generation != program.generation
                || cached.texture_generation != self.textures.generation()
        });
        if stale {
            let group = create_bind_group(&self.ctx, program, &self.textures, &self.sampler)?;
            self.bind_group = Some(CachedBindGroup {
                program_generation: program.generation,
                texture_generation: self.textures.generation(),
                group,
            });
        }
        let bind_group = self
            .bind_group
            .as_ref()
            .map(|cached| &cached.group)
            .ok_or_else(|| AlphaError::invalid_state("bind group missing"))?;

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("alphaframe_composite_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("alphaframe_composite_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear_rgba[0],
                            g: clear_rgba[1],
                            b: clear_rgba[2],
                            a: clear_rgba[3],
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&program.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.set_vertex_buffer(0, geometry.buffer.slice(..));
            pass.draw(0..4, 0..1);
        }
        self.ctx.queue.submit(Some(encoder.finish()));
        Ok(records)
    }
}

fn create_bind_group(
    ctx: &GpuContext,
    program: &ShaderProgram,
    textures: &TextureManager,
    sampler: &wgpu::Sampler,
) -> AlphaResult<wgpu::BindGroup> {
    let video = textures
        .video_view()
        .ok_or_else(|| AlphaError::invalid_state("video texture not uploaded"))?;

    let mut entries = vec![
        wgpu::BindGroupEntry {
            binding: VIDEO_TEXTURE_BINDING,
            resource: wgpu::BindingResource::TextureView(video),
        },
        wgpu::BindGroupEntry {
            binding: SAMPLER_BINDING,
            resource: wgpu::BindingResource::Sampler(sampler),
        },
    ];
    if let Some(buffer) = &program.placements {
        entries.push(wgpu::BindGroupEntry {
            binding: PLACEMENTS_BINDING,
            resource: buffer.as_entire_binding(),
        });
    }
    let mut overlays = 0usize;
    for (unit, view) in textures.overlay_views() {
        entries.push(wgpu::BindGroupEntry {
            binding: overlay_binding(unit),
            resource: wgpu::BindingResource::TextureView(view),
        });
        overlays += 1;
    }
    if overlays != program.source_count {
        return Err(AlphaError::invalid_state(format!(
            "program expects {} overlay textures, {} are bound",
            program.source_count, overlays
        )));
    }

    Ok(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("alphaframe_bind_group"),
        layout: &program.bind_group_layout,
        entries: &entries,
    }))
}
