use crate::{
    foundation::core::FrameIndex,
    player::driver::{FrameTiming, PlaybackSettings},
};

/// Resolve the animation frame for a presented video frame.
///
/// Driver-paced when not looping and the driver counts presented frames
/// (`presented - 1`); otherwise time-paced (`round(time * fps) + offset`).
pub fn resolve_frame_index(timing: &FrameTiming, settings: &PlaybackSettings) -> FrameIndex {
    if !settings.loop_enabled && timing.presented_frames > 0 {
        return FrameIndex(timing.presented_frames as i64 - 1);
    }
    let paced = (timing.time_secs * settings.frame_rate).round() as i64;
    FrameIndex(paced + settings.frame_offset)
}
