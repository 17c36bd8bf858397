use wgpu::util::DeviceExt;

use crate::{
    descriptor::model::VideoAtlasLayout,
    gpu::{context::GpuContext, coord::compute_coord},
};

/// One corner of the full-viewport quad.
///
/// Memory layout (matches `VertexInput` in the vertex stage):
/// - `position`: clip-space `vec2<f32>` at location 0
/// - `tex_coord`: atlas RGB UV at location 1
/// - `alpha_tex_coord`: atlas alpha UV at location 2
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    /// Clip-space position.
    pub position: [f32; 2],
    /// UV into the atlas RGB region.
    pub tex_coord: [f32; 2],
    /// UV into the atlas alpha region.
    pub alpha_tex_coord: [f32; 2],
}

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x2];

    /// Vertex buffer layout for the render pipeline.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Triangle-strip quad covering `[-1, 1] x [-1, 1]`, ordered top-left, top-right,
/// bottom-left, bottom-right, with both UV sets derived from the atlas layout.
pub fn quad_vertices(layout: &VideoAtlasLayout) -> [QuadVertex; 4] {
    let (vw, vh) = (
        f64::from(layout.video_width),
        f64::from(layout.video_height),
    );
    let [rl, rr, rb, rt] = compute_coord(layout.rgb_region, vw, vh).to_f32();
    let [al, ar, ab, at] = compute_coord(layout.alpha_region, vw, vh).to_f32();

    let v = |x: f32, y: f32, rgb: [f32; 2], alpha: [f32; 2]| QuadVertex {
        position: [x, y],
        tex_coord: rgb,
        alpha_tex_coord: alpha,
    };
    [
        v(-1.0, 1.0, [rl, rt], [al, at]),
        v(1.0, 1.0, [rr, rt], [ar, at]),
        v(-1.0, -1.0, [rl, rb], [al, ab]),
        v(1.0, -1.0, [rr, rb], [ar, ab]),
    ]
}

/// The session's static quad vertex buffer.
#[derive(Debug)]
pub(crate) struct QuadGeometry {
    pub(crate) buffer: wgpu::Buffer,
    vertices: [QuadVertex; 4],
}

impl QuadGeometry {
    pub(crate) fn create(ctx: &GpuContext, layout: &VideoAtlasLayout) -> Self {
        let vertices = quad_vertices(layout);
        let buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("alphaframe_quad"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        Self { buffer, vertices }
    }

    /// Re-upload for a new layout; a no-op when the vertices are unchanged.
    pub(crate) fn update(&mut self, ctx: &GpuContext, layout: &VideoAtlasLayout) {
        let vertices = quad_vertices(layout);
        if vertices == self.vertices {
            return;
        }
        ctx.queue
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(&vertices));
        self.vertices = vertices;
    }

    pub(crate) fn release(self) {
        self.buffer.destroy();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/geometry.rs"]
mod tests;
