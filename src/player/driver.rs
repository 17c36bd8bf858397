use crate::foundation::error::AlphaResult;

/// Playback configuration owned by the driver.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Animation frames per second, used for time-paced frame resolution.
    pub frame_rate: f64,
    /// Added to the time-paced frame index.
    pub frame_offset: i64,
    /// Restart from the first frame at end of stream.
    pub loop_enabled: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            frame_offset: 0,
            loop_enabled: false,
        }
    }
}

/// Timing of one presented video frame, as reported by the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTiming {
    /// Playback position in seconds.
    pub time_secs: f64,
    /// Monotonic count of frames presented so far, including this one. `0` when the
    /// driver does not track presentation.
    pub presented_frames: u64,
}

/// The component that owns the decoded video stream and its clock.
///
/// Push-style drivers call [`crate::AlphaVideoPlayer::render_tick`] once per
/// presented frame. Pull-style drivers implement [`PlaybackDriver::poll_frame`] and
/// are pumped by [`crate::AlphaVideoPlayer::run_pending`]. At most one frame is in
/// flight at a time either way.
pub trait PlaybackDriver {
    /// Make the media ready to start. Called from `play`.
    fn prepare_media(&mut self) -> AlphaResult<()>;

    /// Start or resume presentation.
    fn start(&mut self) -> AlphaResult<()>;

    /// Current playback position in seconds.
    fn current_time_secs(&self) -> f64;

    /// Frames presented since the last start, `0` if untracked.
    fn frames_presented(&self) -> u64;

    /// Current playback settings.
    fn settings(&self) -> PlaybackSettings;

    /// Set the animation frame rate (pushed from the descriptor on session start).
    fn set_frame_rate(&mut self, fps: f64);

    /// The decoded atlas frame currently on screen.
    fn current_frame(&self) -> Option<&image::RgbaImage>;

    /// Present the current frame without compositing.
    fn draw_plain(&mut self, _timing: &FrameTiming) {}

    /// Post-draw bookkeeping: advance timing, handle end of stream and looping.
    fn after_draw(&mut self, _timing: &FrameTiming) {}

    /// Next frame to present, or `None` when nothing is due.
    fn poll_frame(&mut self) -> Option<FrameTiming> {
        None
    }

    /// Reset between consecutive plays.
    fn clear(&mut self) {}

    /// Release the media. Must be safe to call repeatedly.
    fn destroy(&mut self) {}
}

impl<D: PlaybackDriver + ?Sized> PlaybackDriver for Box<D> {
    fn prepare_media(&mut self) -> AlphaResult<()> {
        (**self).prepare_media()
    }

    fn start(&mut self) -> AlphaResult<()> {
        (**self).start()
    }

    fn current_time_secs(&self) -> f64 {
        (**self).current_time_secs()
    }

    fn frames_presented(&self) -> u64 {
        (**self).frames_presented()
    }

    fn settings(&self) -> PlaybackSettings {
        (**self).settings()
    }

    fn set_frame_rate(&mut self, fps: f64) {
        (**self).set_frame_rate(fps)
    }

    fn current_frame(&self) -> Option<&image::RgbaImage> {
        (**self).current_frame()
    }

    fn draw_plain(&mut self, timing: &FrameTiming) {
        (**self).draw_plain(timing)
    }

    fn after_draw(&mut self, timing: &FrameTiming) {
        (**self).after_draw(timing)
    }

    fn poll_frame(&mut self) -> Option<FrameTiming> {
        (**self).poll_frame()
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn destroy(&mut self) {
        (**self).destroy()
    }
}
