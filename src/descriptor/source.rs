use crate::{
    descriptor::model::{FrameDescriptor, OverlayResource, SessionMetadata},
    foundation::{core::FrameIndex, error::AlphaResult},
};

/// Provider of per-frame placements and atlas metadata.
///
/// `prepare` may be slow (fetching, parsing, decoding). The player never calls it on
/// the render path; it runs inside a [`crate::PrepareJob`] that the caller can move to
/// any thread. Accessors return meaningful data only after `prepare` succeeded.
pub trait FrameSource {
    /// Load and parse the descriptor. Failures are reported as
    /// [`crate::AlphaError::DescriptorParse`].
    fn prepare(&mut self) -> AlphaResult<()>;

    /// Layout and timing metadata.
    fn metadata(&self) -> Option<&SessionMetadata>;

    /// Overlay resources in declaration order. The order fixes texture units.
    fn resources(&self) -> &[OverlayResource];

    /// Placements for `frame`, or `None` when out of range or empty.
    fn placements_at(&self, frame: FrameIndex) -> Option<&FrameDescriptor>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn prepare(&mut self) -> AlphaResult<()> {
        (**self).prepare()
    }

    fn metadata(&self) -> Option<&SessionMetadata> {
        (**self).metadata()
    }

    fn resources(&self) -> &[OverlayResource] {
        (**self).resources()
    }

    fn placements_at(&self, frame: FrameIndex) -> Option<&FrameDescriptor> {
        (**self).placements_at(frame)
    }
}
