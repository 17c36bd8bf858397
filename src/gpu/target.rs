use crate::{
    foundation::error::{AlphaError, AlphaResult},
    gpu::context::GpuContext,
};

/// Color format of the drawing surface.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A read-back composited frame: RGBA8, top row first, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl FrameRgba {
    /// RGBA of the pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        self.data.get(i..i + 4).and_then(|p| p.try_into().ok())
    }

    /// Convert into an `image` buffer, e.g. for PNG output.
    pub fn into_image(self) -> AlphaResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| AlphaError::gpu("frame buffer size does not match its dimensions"))
    }
}

/// Offscreen drawing surface plus its readback staging buffer.
#[derive(Debug)]
pub(crate) struct RenderTarget {
    pub(crate) width: u32,
    pub(crate) height: u32,
    texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    readback: wgpu::Buffer,
    readback_bytes_per_row: u32,
}

impl RenderTarget {
    pub(crate) fn create(ctx: &GpuContext, width: u32, height: u32) -> AlphaResult<Self> {
        if width == 0 || height == 0 {
            return Err(AlphaError::config("surface width/height must be > 0"));
        }
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("alphaframe_target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bytes_per_row_unpadded = width
            .checked_mul(4)
            .ok_or_else(|| AlphaError::config("surface width overflow"))?;
        let bytes_per_row = align_to(bytes_per_row_unpadded, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer_size = u64::from(bytes_per_row)
            .checked_mul(u64::from(height))
            .ok_or_else(|| AlphaError::config("readback buffer size overflow"))?;
        let readback = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("alphaframe_readback"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            width,
            height,
            texture,
            view,
            readback,
            readback_bytes_per_row: bytes_per_row,
        })
    }

    /// Fill the whole surface with `rgba`.
    pub(crate) fn clear(&self, ctx: &GpuContext, rgba: [f64; 4]) {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("alphaframe_clear"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("alphaframe_clear_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(rgba)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        ctx.queue.submit(Some(encoder.finish()));
    }

    /// Copy the surface back to host memory.
    pub(crate) fn read(&self, ctx: &GpuContext) -> AlphaResult<FrameRgba> {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("alphaframe_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.readback_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        ctx.queue.submit(Some(encoder.finish()));

        let buffer_slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        ctx.wait_idle()?;
        rx.recv()
            .map_err(|_| AlphaError::gpu("readback channel closed"))?
            .map_err(|e| AlphaError::gpu(format!("readback map failed: {e:?}")))?;

        let mapped = buffer_slice.get_mapped_range();
        let data = unpad_rows(
            &mapped,
            self.width as usize * 4,
            self.readback_bytes_per_row as usize,
            self.height as usize,
        );
        drop(mapped);
        self.readback.unmap();

        Ok(FrameRgba {
            width: self.width,
            height: self.height,
            data,
        })
    }

    pub(crate) fn release(self) {
        self.texture.destroy();
        self.readback.destroy();
    }
}

pub(crate) fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

fn unpad_rows(padded: &[u8], row_bytes: usize, padded_row_bytes: usize, rows: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let start = row * padded_row_bytes;
        out.extend_from_slice(&padded[start..start + row_bytes]);
    }
    out
}

fn clear_color([r, g, b, a]: [f64; 4]) -> wgpu::Color {
    wgpu::Color { r, g, b, a }
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/target.rs"]
mod tests;
