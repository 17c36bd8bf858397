//! alphaframe composites alpha videos on the GPU.
//!
//! An alpha video is one opaque video stream whose frames pack RGB color in one
//! region and a grayscale transparency mask in another. alphaframe recombines the
//! two planes and, driven by a per-frame animation descriptor, composites any
//! number of overlay images into regions masked by the same alpha plane, in a
//! single draw per presented frame.
//!
//! # Pipeline overview
//!
//! 1. **Prepare**: a [`FrameSource`] (e.g. [`JsonFrameSource`]) loads the atlas
//!    layout, the overlay resources and the per-frame placements.
//! 2. **Build**: the fragment program is generated for the overlay count `N`,
//!    validated with naga and compiled; overlays are bound to texture units `1..=N`.
//! 3. **Composite**: for every frame the [`PlaybackDriver`] presents, placements are
//!    packed into a fixed-size uniform array and the quad is drawn over the atlas.
//!
//! [`AlphaVideoPlayer`] owns the lifecycle: `play` hands out a [`PrepareJob`] that
//! can run on any thread, `complete` applies it, `render_tick` / `run_pending`
//! draw, `clear` and `destroy` reset.
//!
//! # Design constraints
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Degrade, don't fail**: a missing GPU or a rejected program leaves the driver
//!   presenting plain frames.
//! - **Straight-alpha overlays**, RGBA8 everywhere.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod descriptor;
mod foundation;
mod gpu;
mod player;
mod render;

pub use descriptor::json::JsonFrameSource;
pub use descriptor::model::{
    FrameDescriptor, OverlayResource, Placement, SessionMetadata, VideoAtlasLayout,
};
pub use descriptor::source::FrameSource;
pub use foundation::core::{FrameIndex, PixelRect, UvBounds};
pub use foundation::error::{AlphaError, AlphaResult};
pub use gpu::context::{GpuContext, GpuOptions};
pub use gpu::coord::compute_coord;
pub use gpu::geometry::{QuadVertex, quad_vertices};
pub use gpu::shader::{
    PLACEMENT_STRIDE, ShaderVariantCache, VERTEX_SHADER, fragment_source, placement_slots,
    validate_wgsl,
};
pub use gpu::target::FrameRgba;
pub use gpu::textures::UnitTable;
pub use player::driver::{FrameTiming, PlaybackDriver, PlaybackSettings};
pub use player::events::{FrameEvent, FrameObserver, ObserverId};
pub use player::lifecycle::{
    AlphaVideoPlayer, PlaybackMode, PlayerConfig, PlayerState, PrepareJob, PreparedJob,
    TickOutcome,
};
pub use player::sequence::FrameSequenceDriver;
pub use render::clock::resolve_frame_index;
pub use render::packing::{PlacementPacker, PlacementRecord};
