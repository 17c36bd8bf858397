use crate::{
    descriptor::model::{FrameDescriptor, SessionMetadata},
    foundation::core::FrameIndex,
};

/// Emitted once per composited frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameEvent<'a> {
    /// Resolved animation frame index (0-based).
    pub frame: FrameIndex,
    /// Placements of this frame, `None` when the frame has none.
    pub descriptor: Option<&'a FrameDescriptor>,
    /// Session-wide descriptor metadata.
    pub metadata: &'a SessionMetadata,
    /// Placement records actually drawn (after dropping unknown sources).
    pub records: usize,
}

/// Boxed frame listener.
pub type FrameObserver = Box<dyn FnMut(&FrameEvent<'_>) + Send>;

/// Handle returned by [`crate::AlphaVideoPlayer::on_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Default)]
pub(crate) struct Observers {
    next: u64,
    list: Vec<(ObserverId, FrameObserver)>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: FrameObserver) -> ObserverId {
        let id = ObserverId(self.next);
        self.next += 1;
        self.list.push((id, observer));
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.list.len();
        self.list.retain(|(existing, _)| *existing != id);
        self.list.len() != before
    }

    pub(crate) fn emit(&mut self, event: &FrameEvent<'_>) {
        for (_, observer) in &mut self.list {
            observer(event);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.list.len())
            .finish()
    }
}
