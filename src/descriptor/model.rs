use std::sync::Arc;

use crate::foundation::{
    core::PixelRect,
    error::{AlphaError, AlphaResult},
};

/// How one opaque video frame encodes color and transparency.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoAtlasLayout {
    /// Full decoded frame width in pixels.
    pub video_width: u32,
    /// Full decoded frame height in pixels.
    pub video_height: u32,
    /// Region holding the RGB color plane.
    pub rgb_region: PixelRect,
    /// Region holding the grayscale alpha plane.
    pub alpha_region: PixelRect,
}

impl VideoAtlasLayout {
    /// Reject zero-sized atlases and regions outside the atlas bounds.
    pub fn validate(&self) -> AlphaResult<()> {
        if self.video_width == 0 || self.video_height == 0 {
            return Err(AlphaError::descriptor_parse(
                "video width/height must be > 0",
            ));
        }
        let (vw, vh) = (f64::from(self.video_width), f64::from(self.video_height));
        if !self.rgb_region.fits_within(vw, vh) {
            return Err(AlphaError::descriptor_parse(format!(
                "rgb region {:?} exceeds the {}x{} atlas",
                self.rgb_region, self.video_width, self.video_height
            )));
        }
        if !self.alpha_region.fits_within(vw, vh) {
            return Err(AlphaError::descriptor_parse(format!(
                "alpha region {:?} exceeds the {}x{} atlas",
                self.alpha_region, self.video_width, self.video_height
            )));
        }
        Ok(())
    }
}

/// One overlay image placed on one animation frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    /// Id of the overlay resource to draw.
    pub source_id: String,
    /// Destination, relative to the visible (RGB) video frame.
    pub dest_rect: PixelRect,
    /// Region of the atlas alpha plane supplying per-pixel opacity, in atlas pixels.
    pub mask_rect: PixelRect,
}

/// Ordered placements for one frame. Later entries are composited over earlier ones.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameDescriptor {
    /// Placements in painter's order.
    pub placements: Vec<Placement>,
}

/// An auxiliary overlay image registered for a session.
#[derive(Clone, Debug)]
pub struct OverlayResource {
    /// Id referenced by [`Placement::source_id`].
    pub id: String,
    /// Decoded straight-alpha RGBA8 bitmap.
    pub image: Arc<image::RgbaImage>,
}

impl OverlayResource {
    /// Register `image` under `id`.
    pub fn new(id: impl Into<String>, image: impl Into<Arc<image::RgbaImage>>) -> Self {
        Self {
            id: id.into(),
            image: image.into(),
        }
    }
}

/// Global descriptor metadata, available once the source has prepared.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SessionMetadata {
    /// Atlas layout for the whole session.
    pub layout: VideoAtlasLayout,
    /// Display size of the composited output.
    pub display_width: u32,
    /// Display size of the composited output.
    pub display_height: u32,
    /// Animation frame rate, when the descriptor declares one.
    pub frame_rate: Option<f64>,
    /// Declared frame count, when known.
    pub frame_count: Option<u64>,
}
