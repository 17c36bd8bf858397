use crate::{
    descriptor::{
        model::{OverlayResource, SessionMetadata},
        source::FrameSource,
    },
    foundation::{
        core::FrameIndex,
        error::{AlphaError, AlphaResult},
    },
    gpu::{
        context::{GpuContext, GpuOptions},
        target::FrameRgba,
    },
    player::{
        driver::{FrameTiming, PlaybackDriver},
        events::{FrameEvent, ObserverId, Observers},
    },
    render::{clock::resolve_frame_index, session::Session},
};

/// Player options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Output width; defaults to the descriptor's display width.
    pub width: Option<u32>,
    /// Output height; defaults to the descriptor's display height.
    pub height: Option<u32>,
    /// Frame rate used when the descriptor declares none.
    pub fallback_fps: f64,
    /// Surface clear color, straight RGBA in `[0, 1]`.
    pub clear_rgba: [f64; 4],
    /// Adapter selection.
    pub gpu: GpuOptions,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            fallback_fps: 30.0,
            clear_rgba: [0.0; 4],
            gpu: GpuOptions::default(),
        }
    }
}

/// Lifecycle state of [`AlphaVideoPlayer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    /// No prepared session; frames render plain, if at all.
    Uninitialized,
    /// Waiting for the frame source preparation to complete.
    Initializing,
    /// Compositing every presented frame.
    Ready,
    /// Blanking the surface between plays.
    Clearing,
    /// Releasing every GPU object.
    Destroying,
}

/// How presented frames currently reach the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Nothing is playing.
    Idle,
    /// The driver presents frames itself, without overlays.
    Plain,
    /// Frames are composited by the renderer.
    Composited,
}

/// Result of one [`AlphaVideoPlayer::render_tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame was composited for this animation frame.
    Composited(FrameIndex),
    /// The frame went through the driver's plain path.
    Plain,
}

/// Pending frame-source preparation handed out by [`AlphaVideoPlayer::play`].
///
/// Run it on any thread, then hand the result to [`AlphaVideoPlayer::complete`].
#[must_use = "the session stays Initializing until the job is run and completed"]
#[derive(Debug)]
pub struct PrepareJob<S> {
    epoch: u64,
    source: S,
}

impl<S: FrameSource> PrepareJob<S> {
    /// Play request this job belongs to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Prepare the source. May be slow.
    pub fn run(mut self) -> PreparedJob<S> {
        let result = self.source.prepare();
        PreparedJob {
            epoch: self.epoch,
            source: self.source,
            result,
        }
    }
}

/// Outcome of a [`PrepareJob`].
#[derive(Debug)]
pub struct PreparedJob<S> {
    epoch: u64,
    source: S,
    result: AlphaResult<()>,
}

impl<S> PreparedJob<S> {
    /// Play request this result belongs to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// `true` when the source prepared successfully.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Alpha-video player: drives the renderer session through
/// `Uninitialized -> Initializing -> Ready -> (Clearing | Destroying)`.
///
/// Failures inside the lifecycle are logged and turned into state changes; a
/// frame that cannot be composited is handed to the driver's plain path instead.
pub struct AlphaVideoPlayer<D, S> {
    config: PlayerConfig,
    driver: D,
    state: PlayerState,
    mode: PlaybackMode,
    epoch: u64,
    driver_live: bool,
    source: Option<S>,
    session: Option<Session>,
    shared_context: Option<GpuContext>,
    observers: Observers,
}

impl<D: PlaybackDriver, S: FrameSource> AlphaVideoPlayer<D, S> {
    /// Player over `driver`. No GPU work happens until a source has prepared.
    pub fn new(driver: D, config: PlayerConfig) -> Self {
        Self {
            config,
            driver,
            state: PlayerState::Uninitialized,
            mode: PlaybackMode::Idle,
            epoch: 0,
            driver_live: false,
            source: None,
            session: None,
            shared_context: None,
            observers: Observers::default(),
        }
    }

    /// Build sessions on `ctx` instead of requesting a new device.
    pub fn with_context(mut self, ctx: GpuContext) -> Self {
        self.shared_context = Some(ctx);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Current presentation mode.
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Player options.
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// The playback driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The playback driver, mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// The prepared frame source of the current session.
    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    /// Descriptor metadata of the current session.
    pub fn metadata(&self) -> Option<&SessionMetadata> {
        self.source.as_ref()?.metadata()
    }

    /// Register a listener called after every composited frame.
    pub fn on_frame(&mut self, observer: impl FnMut(&FrameEvent<'_>) + Send + 'static) -> ObserverId {
        self.observers.add(Box::new(observer))
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Start playback.
    ///
    /// With a source, clears the previous play, prepares the driver media and
    /// returns the job that prepares the source. Without one, resumes the current
    /// session; with no session that is an [`AlphaError::Config`].
    pub fn play(&mut self, source: Option<S>) -> AlphaResult<Option<PrepareJob<S>>> {
        let Some(source) = source else {
            if self.source.is_some() && self.mode != PlaybackMode::Idle {
                self.driver.start()?;
                tracing::debug!(state = ?self.state, "playback resumed");
                return Ok(None);
            }
            let err = AlphaError::config("no animation config supplied and no session to resume");
            tracing::warn!(error = %err, "play aborted");
            return Err(err);
        };

        if self.driver_live || self.session.is_some() {
            self.clear();
        }
        self.epoch += 1;
        self.source = None;
        self.mode = PlaybackMode::Idle;

        if let Err(err) = self.driver.prepare_media() {
            tracing::error!(error = %err, "driver media preparation failed");
            self.state = PlayerState::Uninitialized;
            return Err(err);
        }
        self.driver_live = true;
        self.state = PlayerState::Initializing;
        tracing::debug!(epoch = self.epoch, "initializing");
        Ok(Some(PrepareJob {
            epoch: self.epoch,
            source,
        }))
    }

    /// [`AlphaVideoPlayer::play`] with the preparation run on the calling thread.
    pub fn play_blocking(&mut self, source: S) -> AlphaResult<()> {
        match self.play(Some(source))? {
            Some(job) => self.complete(job.run()),
            None => Ok(()),
        }
    }

    /// Apply a finished preparation.
    ///
    /// Results from a superseded play, or arriving after `destroy`, are discarded.
    /// A failed preparation leaves the player `Uninitialized` and is returned. When
    /// the GPU context or program cannot be built the driver still starts, in
    /// [`PlaybackMode::Plain`].
    #[tracing::instrument(skip_all, fields(epoch = prepared.epoch))]
    pub fn complete(&mut self, prepared: PreparedJob<S>) -> AlphaResult<()> {
        let PreparedJob {
            epoch,
            source,
            result,
        } = prepared;
        if epoch != self.epoch || self.state != PlayerState::Initializing {
            tracing::debug!(current = self.epoch, state = ?self.state, "discarding stale preparation");
            return Ok(());
        }

        let metadata = match result.and_then(|()| {
            source
                .metadata()
                .cloned()
                .ok_or_else(|| AlphaError::descriptor_parse("source prepared without metadata"))
        }) {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::error!(error = %err, "frame descriptor preparation failed; session aborted");
                self.state = PlayerState::Uninitialized;
                self.mode = PlaybackMode::Idle;
                return Err(err);
            }
        };

        self.driver
            .set_frame_rate(metadata.frame_rate.unwrap_or(self.config.fallback_fps));

        match self.enter_ready(&metadata, source.resources()) {
            Ok(()) => {
                self.state = PlayerState::Ready;
                self.mode = PlaybackMode::Composited;
                tracing::info!(sources = source.resources().len(), "alpha video session ready");
            }
            Err(err) => {
                tracing::warn!(error = %err, "compositing unavailable; playing without overlays");
                self.state = PlayerState::Uninitialized;
                self.mode = PlaybackMode::Plain;
            }
        }
        self.source = Some(source);

        if let Err(err) = self.driver.start() {
            tracing::error!(error = %err, "driver failed to start");
            self.mode = PlaybackMode::Idle;
            return Err(err);
        }
        Ok(())
    }

    fn enter_ready(
        &mut self,
        metadata: &SessionMetadata,
        resources: &[OverlayResource],
    ) -> AlphaResult<()> {
        let width = self.config.width.unwrap_or(metadata.display_width);
        let height = self.config.height.unwrap_or(metadata.display_height);
        if let Some(session) = self.session.as_mut() {
            return session.configure(metadata, resources, width, height);
        }
        let ctx = match self.shared_context.clone() {
            Some(ctx) => ctx,
            None => GpuContext::request(&self.config.gpu)?,
        };
        self.session = Some(Session::create(ctx, metadata, resources, width, height)?);
        Ok(())
    }

    /// Per-frame hook for the driver.
    ///
    /// Composites when `Ready`; otherwise, or when compositing this frame fails,
    /// the driver draws the frame plain. Driver bookkeeping runs either way.
    pub fn render_tick(&mut self, timing: FrameTiming) -> TickOutcome {
        let outcome = if self.state == PlayerState::Ready {
            match self.draw_composited(&timing) {
                Ok(frame) => TickOutcome::Composited(frame),
                Err(err) => {
                    tracing::warn!(error = %err, "composite failed; drawing plain frame");
                    self.driver.draw_plain(&timing);
                    TickOutcome::Plain
                }
            }
        } else {
            self.driver.draw_plain(&timing);
            TickOutcome::Plain
        };
        self.driver.after_draw(&timing);
        outcome
    }

    /// [`AlphaVideoPlayer::render_tick`] with timing read from the driver's clock.
    pub fn render_current(&mut self) -> TickOutcome {
        let timing = FrameTiming {
            time_secs: self.driver.current_time_secs(),
            presented_frames: self.driver.frames_presented(),
        };
        self.render_tick(timing)
    }

    fn draw_composited(&mut self, timing: &FrameTiming) -> AlphaResult<FrameIndex> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| AlphaError::invalid_state("draw without a session"))?;
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| AlphaError::invalid_state("draw without a prepared source"))?;
        let metadata = source
            .metadata()
            .ok_or_else(|| AlphaError::invalid_state("source lost its metadata"))?;

        let frame = resolve_frame_index(timing, &self.driver.settings());
        let placements = source.placements_at(frame);
        let video = self
            .driver
            .current_frame()
            .ok_or_else(|| AlphaError::invalid_state("driver has no decoded frame"))?;

        let records = session.composite(video, placements, self.config.clear_rgba)?;
        self.observers.emit(&FrameEvent {
            frame,
            descriptor: placements,
            metadata,
            records,
        });
        Ok(frame)
    }

    /// Pump a pull-style driver until it has no frame due. Returns the number of
    /// frames rendered.
    pub fn run_pending(&mut self) -> usize {
        let mut frames = 0;
        while let Some(timing) = self.driver.poll_frame() {
            self.render_tick(timing);
            frames += 1;
        }
        frames
    }

    /// Reset between plays: blank the surface and reset the driver. GPU objects
    /// are kept for reuse.
    pub fn clear(&mut self) {
        let previous = self.state;
        self.state = PlayerState::Clearing;
        self.driver.clear();
        if let Some(session) = &self.session {
            session.clear(self.config.clear_rgba);
        }
        self.state = previous;
        tracing::debug!(state = ?self.state, "cleared");
    }

    /// Release every GPU object and the driver media. Pending preparations are
    /// discarded. Calling it again is a no-op.
    pub fn destroy(&mut self) {
        self.epoch += 1;
        let nothing_live = self.state == PlayerState::Uninitialized
            && self.session.is_none()
            && self.source.is_none()
            && !self.driver_live;
        if nothing_live {
            tracing::debug!("destroy: nothing to release");
            return;
        }

        self.state = PlayerState::Destroying;
        if let Some(session) = self.session.take() {
            session.release();
        }
        self.source = None;
        self.driver.destroy();
        self.driver_live = false;
        self.mode = PlaybackMode::Idle;
        self.state = PlayerState::Uninitialized;
        tracing::debug!("destroyed");
    }

    /// Read back the composited surface. Only valid while `Ready`.
    pub fn read_frame(&self) -> AlphaResult<FrameRgba> {
        if self.state != PlayerState::Ready {
            return Err(AlphaError::invalid_state(format!(
                "read_frame in state {:?}",
                self.state
            )));
        }
        self.session
            .as_ref()
            .ok_or_else(|| AlphaError::invalid_state("no session"))?
            .read()
    }
}

impl<D, S> std::fmt::Debug for AlphaVideoPlayer<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaVideoPlayer")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("epoch", &self.epoch)
            .field("has_session", &self.session.is_some())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/player/lifecycle.rs"]
mod tests;
