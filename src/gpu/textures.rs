use std::collections::HashMap;

use crate::{
    descriptor::model::OverlayResource,
    foundation::error::{AlphaError, AlphaResult},
    gpu::context::GpuContext,
};

/// Texture unit of the video atlas. Overlay units start at 1.
pub const VIDEO_UNIT: u32 = 0;

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// `source id -> texture unit` assignment for one session.
///
/// The `i`-th resource gets unit `i + 1`, so units stay contiguous (`1..=N`) and
/// binding the same ordered set again yields the same mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitTable {
    units: HashMap<String, u32>,
}

impl UnitTable {
    /// Assign units for `ids` in order and return them in the same order.
    pub fn assign<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> Vec<u32> {
        let mut assigned = Vec::new();
        let mut next = HashMap::new();
        for (i, id) in ids.into_iter().enumerate() {
            let unit = i as u32 + 1;
            if let Some(old) = self.units.get(id).filter(|&&old| old != unit) {
                tracing::debug!(id, old, unit, "source moved to a new texture unit");
            }
            next.insert(id.to_owned(), unit);
            assigned.push(unit);
        }
        self.units = next;
        assigned
    }

    /// Unit bound to `id`, if registered.
    pub fn unit_of(&self, id: &str) -> Option<u32> {
        self.units.get(id).copied()
    }

    /// Number of registered overlay sources.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// `true` when no overlay source is registered.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[derive(Debug)]
struct BoundTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl BoundTexture {
    fn create(ctx: &GpuContext, label: &str, width: u32, height: u32) -> Self {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

/// GPU textures for the video atlas (unit 0) and every overlay resource.
///
/// [`TextureManager::bind`] allocates the overlay units. Unit 0 is allocated lazily
/// by the first [`TextureManager::upload_video`], once the decoded frame size is
/// known. Textures are reused in place while their size is unchanged. Every upload
/// is flipped vertically so that atlas row 0 sits at `v = 1`.
#[derive(Debug, Default)]
pub(crate) struct TextureManager {
    units: UnitTable,
    video: Option<BoundTexture>,
    overlays: Vec<(u32, BoundTexture)>,
    scratch: Vec<u8>,
    generation: u64,
}

impl TextureManager {
    pub(crate) fn units(&self) -> &UnitTable {
        &self.units
    }

    /// Bumped whenever a texture view is replaced; bind groups built for an older
    /// generation are stale.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Bind `resources` to units `1..=N`, uploading each image.
    #[tracing::instrument(skip_all, fields(count = resources.len()))]
    pub(crate) fn bind(
        &mut self,
        ctx: &GpuContext,
        resources: &[OverlayResource],
    ) -> AlphaResult<()> {
        if let Some(empty) = resources
            .iter()
            .find(|r| r.image.width() == 0 || r.image.height() == 0)
        {
            return Err(AlphaError::config(format!(
                "overlay '{}' has an empty image",
                empty.id
            )));
        }

        let units = self.units.assign(resources.iter().map(|r| r.id.as_str()));
        let mut previous: HashMap<u32, BoundTexture> = self.overlays.drain(..).collect();

        for (resource, unit) in resources.iter().zip(units) {
            let (w, h) = resource.image.dimensions();
            let bound = match previous.remove(&unit) {
                Some(existing) if existing.matches(w, h) => existing,
                stale => {
                    if let Some(stale) = stale {
                        stale.texture.destroy();
                    }
                    self.generation += 1;
                    BoundTexture::create(ctx, &format!("alphaframe_overlay_{unit}"), w, h)
                }
            };
            write_flipped(ctx, &bound, resource.image.as_raw(), &mut self.scratch);
            self.overlays.push((unit, bound));
        }

        for (_, leftover) in previous {
            leftover.texture.destroy();
            self.generation += 1;
        }
        self.overlays.sort_by_key(|(unit, _)| *unit);
        tracing::debug!(units = self.overlays.len(), "overlay textures bound");
        Ok(())
    }

    /// Upload the current decoded video frame into unit 0.
    pub(crate) fn upload_video(
        &mut self,
        ctx: &GpuContext,
        frame: &image::RgbaImage,
    ) -> AlphaResult<()> {
        let (w, h) = frame.dimensions();
        if w == 0 || h == 0 {
            return Err(AlphaError::invalid_state("video frame is empty"));
        }
        let reuse = self.video.as_ref().is_some_and(|v| v.matches(w, h));
        if !reuse {
            if let Some(old) = self.video.take() {
                old.texture.destroy();
            }
            tracing::debug!(width = w, height = h, "allocated video texture");
            self.video = Some(BoundTexture::create(ctx, "alphaframe_video", w, h));
            self.generation += 1;
        }
        let video = self
            .video
            .as_ref()
            .ok_or_else(|| AlphaError::invalid_state("video texture missing"))?;
        write_flipped(ctx, video, frame.as_raw(), &mut self.scratch);
        Ok(())
    }

    pub(crate) fn video_view(&self) -> Option<&wgpu::TextureView> {
        self.video.as_ref().map(|v| &v.view)
    }

    /// Overlay views ordered by unit.
    pub(crate) fn overlay_views(&self) -> impl Iterator<Item = (u32, &wgpu::TextureView)> {
        self.overlays.iter().map(|(unit, b)| (*unit, &b.view))
    }

    /// Destroy every texture and forget the unit table.
    pub(crate) fn release(&mut self) {
        if let Some(video) = self.video.take() {
            video.texture.destroy();
        }
        for (_, bound) in self.overlays.drain(..) {
            bound.texture.destroy();
        }
        self.units = UnitTable::default();
        self.scratch = Vec::new();
    }
}

fn write_flipped(ctx: &GpuContext, dst: &BoundTexture, rgba: &[u8], scratch: &mut Vec<u8>) {
    flip_rows(rgba, dst.width as usize * 4, scratch);
    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &dst.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        scratch,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(dst.width * 4),
            rows_per_image: Some(dst.height),
        },
        wgpu::Extent3d {
            width: dst.width,
            height: dst.height,
            depth_or_array_layers: 1,
        },
    );
}

/// Copy `src` into `out` with its rows in reverse order.
pub(crate) fn flip_rows(src: &[u8], row_bytes: usize, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(src.len());
    for row in src.chunks_exact(row_bytes).rev() {
        out.extend_from_slice(row);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/textures.rs"]
mod tests;
