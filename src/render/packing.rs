use crate::{
    descriptor::model::{FrameDescriptor, Placement, VideoAtlasLayout},
    gpu::{
        coord::compute_coord,
        shader::{PLACEMENT_STRIDE, placement_slots},
        textures::{UnitTable, VIDEO_UNIT},
    },
};

/// GPU encoding of one placement: nine consecutive floats
/// `[unit, dst_l, dst_r, dst_b, dst_t, mask_l, mask_r, mask_b, mask_t]`.
///
/// A unit `<= 0` marks an empty record.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PlacementRecord {
    /// Texture unit of the overlay, as a float.
    pub unit: f32,
    /// Destination bounds in atlas UV space, `[left, right, bottom, top]`.
    pub dest: [f32; 4],
    /// Mask bounds in atlas UV space, `[left, right, bottom, top]`.
    pub mask: [f32; 4],
}

impl PlacementRecord {
    /// Encode `placement` for overlay `unit`.
    ///
    /// The destination is relative to the visible frame, so it is shifted by the RGB
    /// region origin before the transform. The mask is already in atlas pixels.
    pub fn encode(placement: &Placement, layout: &VideoAtlasLayout, unit: u32) -> Self {
        let (vw, vh) = (
            f64::from(layout.video_width),
            f64::from(layout.video_height),
        );
        let dest = placement
            .dest_rect
            .offset(layout.rgb_region.x, layout.rgb_region.y);
        Self {
            unit: unit as f32,
            dest: compute_coord(dest, vw, vh).to_f32(),
            mask: compute_coord(placement.mask_rect, vw, vh).to_f32(),
        }
    }

    /// The record as its nine floats.
    pub fn to_array(&self) -> [f32; PLACEMENT_STRIDE] {
        let [d0, d1, d2, d3] = self.dest;
        let [m0, m1, m2, m3] = self.mask;
        [self.unit, d0, d1, d2, d3, m0, m1, m2, m3]
    }
}

/// Packs a frame's placements into the fixed-size placement array of a program
/// built for `capacity` sources.
///
/// The array is zeroed before every pack, so records left by a frame with more
/// placements never survive into a shorter one.
#[derive(Debug, Clone)]
pub struct PlacementPacker {
    capacity: usize,
    records: Vec<PlacementRecord>,
    buffer: Vec<f32>,
    gpu_dirty: bool,
}

impl PlacementPacker {
    /// Packer for a program with `capacity` overlay sources.
    ///
    /// The device-side copy is treated as dirty until the first upload.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Vec::with_capacity(capacity),
            buffer: vec![0.0; placement_slots(capacity) * 4],
            gpu_dirty: capacity > 0,
        }
    }

    /// Maximum records per frame.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Encode `frame` in order. Placements with an unregistered source are dropped,
    /// placements past `capacity` are truncated.
    pub fn pack(
        &mut self,
        frame: Option<&FrameDescriptor>,
        layout: &VideoAtlasLayout,
        units: &UnitTable,
    ) -> &[PlacementRecord] {
        self.records.clear();
        let Some(frame) = frame else {
            return &self.records;
        };

        let mut truncated = 0usize;
        for placement in &frame.placements {
            let Some(unit) = units
                .unit_of(&placement.source_id)
                .filter(|&u| u > VIDEO_UNIT)
            else {
                tracing::trace!(source = %placement.source_id, "dropping placement with unknown source");
                continue;
            };
            if self.records.len() == self.capacity {
                truncated += 1;
                continue;
            }
            self.records
                .push(PlacementRecord::encode(placement, layout, unit));
        }
        if truncated > 0 {
            tracing::warn!(
                truncated,
                capacity = self.capacity,
                "frame has more placements than registered sources"
            );
        }
        &self.records
    }

    /// Records produced by the last [`PlacementPacker::pack`].
    pub fn records(&self) -> &[PlacementRecord] {
        &self.records
    }

    /// Bytes to write to the placement uniform, or `None` when the device copy is
    /// already all empty records and this frame produced none.
    pub fn upload_bytes(&mut self) -> Option<&[u8]> {
        if self.capacity == 0 || (self.records.is_empty() && !self.gpu_dirty) {
            return None;
        }
        self.buffer.fill(0.0);
        for (slot, record) in self
            .buffer
            .chunks_exact_mut(PLACEMENT_STRIDE)
            .zip(&self.records)
        {
            slot.copy_from_slice(&record.to_array());
        }
        self.gpu_dirty = !self.records.is_empty();
        Some(bytemuck::cast_slice(&self.buffer))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/packing.rs"]
mod tests;
