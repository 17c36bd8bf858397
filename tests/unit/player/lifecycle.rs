use super::*;
use crate::{
    descriptor::model::{FrameDescriptor, VideoAtlasLayout},
    foundation::core::PixelRect,
    player::driver::PlaybackSettings,
};

#[derive(Debug, Default)]
struct StubDriver {
    prepared: u32,
    started: u32,
    plain: u32,
    after: u32,
    cleared: u32,
    destroyed: u32,
    fps: Option<f64>,
}

impl PlaybackDriver for StubDriver {
    fn prepare_media(&mut self) -> AlphaResult<()> {
        self.prepared += 1;
        Ok(())
    }

    fn start(&mut self) -> AlphaResult<()> {
        self.started += 1;
        Ok(())
    }

    fn current_time_secs(&self) -> f64 {
        0.0
    }

    fn frames_presented(&self) -> u64 {
        0
    }

    fn settings(&self) -> PlaybackSettings {
        PlaybackSettings::default()
    }

    fn set_frame_rate(&mut self, fps: f64) {
        self.fps = Some(fps);
    }

    fn current_frame(&self) -> Option<&image::RgbaImage> {
        None
    }

    fn draw_plain(&mut self, _timing: &FrameTiming) {
        self.plain += 1;
    }

    fn after_draw(&mut self, _timing: &FrameTiming) {
        self.after += 1;
    }

    fn clear(&mut self) {
        self.cleared += 1;
    }

    fn destroy(&mut self) {
        self.destroyed += 1;
    }
}

#[derive(Debug)]
struct StubSource {
    fail: bool,
    metadata: Option<SessionMetadata>,
    resources: Vec<OverlayResource>,
}

impl StubSource {
    fn ok() -> Self {
        Self {
            fail: false,
            metadata: None,
            resources: Vec::new(),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok()
        }
    }

    /// Prepares fine, but its one overlay cannot be uploaded.
    fn empty_overlay() -> Self {
        Self {
            resources: vec![OverlayResource::new("1", image::RgbaImage::new(0, 0))],
            ..Self::ok()
        }
    }
}

impl FrameSource for StubSource {
    fn prepare(&mut self) -> AlphaResult<()> {
        if self.fail {
            return Err(AlphaError::descriptor_parse("bad json"));
        }
        self.metadata = Some(SessionMetadata {
            layout: VideoAtlasLayout {
                video_width: 4,
                video_height: 2,
                rgb_region: PixelRect::new(0.0, 0.0, 2.0, 2.0),
                alpha_region: PixelRect::new(2.0, 0.0, 2.0, 2.0),
            },
            display_width: 2,
            display_height: 2,
            frame_rate: Some(24.0),
            frame_count: Some(1),
        });
        Ok(())
    }

    fn metadata(&self) -> Option<&SessionMetadata> {
        self.metadata.as_ref()
    }

    fn resources(&self) -> &[OverlayResource] {
        &self.resources
    }

    fn placements_at(&self, _frame: FrameIndex) -> Option<&FrameDescriptor> {
        None
    }
}

fn player() -> AlphaVideoPlayer<StubDriver, StubSource> {
    AlphaVideoPlayer::new(StubDriver::default(), PlayerConfig::default())
}

fn context() -> Option<GpuContext> {
    match GpuContext::request(&GpuOptions::default()) {
        Ok(ctx) => Some(ctx),
        Err(AlphaError::ContextUnavailable(_)) => None,
        Err(e) => panic!("unexpected gpu error: {e}"),
    }
}

#[test]
fn play_without_config_is_a_config_error() {
    let mut p = player();
    let err = p.play(None).unwrap_err();
    assert!(matches!(err, AlphaError::Config(_)));
    assert_eq!(p.state(), PlayerState::Uninitialized);
    assert_eq!(p.driver().prepared, 0);
}

#[test]
fn play_enters_initializing_and_prepares_media() {
    let mut p = player();
    let job = p.play(Some(StubSource::ok())).unwrap().unwrap();
    assert_eq!(p.state(), PlayerState::Initializing);
    assert_eq!(job.epoch(), 1);
    assert_eq!(p.driver().prepared, 1);
    assert_eq!(p.driver().started, 0);
}

#[test]
fn failed_preparation_stays_uninitialized() {
    let mut p = player();
    let job = p.play(Some(StubSource::failing())).unwrap().unwrap();
    let prepared = job.run();
    assert!(!prepared.succeeded());

    let err = p.complete(prepared).unwrap_err();
    assert!(matches!(err, AlphaError::DescriptorParse(_)));
    assert_eq!(p.state(), PlayerState::Uninitialized);
    assert_eq!(p.mode(), PlaybackMode::Idle);
    assert_eq!(p.driver().started, 0);
    assert!(p.source().is_none());
}

#[test]
fn destroy_discards_an_outstanding_preparation() {
    let mut p = player();
    let job = p.play(Some(StubSource::ok())).unwrap().unwrap();
    p.destroy();
    assert_eq!(p.driver().destroyed, 1);

    p.complete(job.run()).unwrap();
    assert_eq!(p.state(), PlayerState::Uninitialized);
    assert!(p.source().is_none());
    assert_eq!(p.driver().started, 0);
    assert_eq!(p.driver().fps, None);
}

#[test]
fn a_newer_play_supersedes_the_older_job() {
    let mut p = player();
    let first = p.play(Some(StubSource::ok())).unwrap().unwrap();
    let second = p.play(Some(StubSource::failing())).unwrap().unwrap();
    assert!(second.epoch() > first.epoch());

    p.complete(first.run()).unwrap();
    assert_eq!(p.state(), PlayerState::Initializing);
    assert!(p.complete(second.run()).is_err());
}

#[test]
fn destroy_twice_is_a_no_op() {
    let mut p = player();
    p.destroy();
    assert_eq!(p.driver().destroyed, 0);

    let _job = p.play(Some(StubSource::ok())).unwrap();
    p.destroy();
    p.destroy();
    assert_eq!(p.driver().destroyed, 1);
    assert_eq!(p.state(), PlayerState::Uninitialized);
}

#[test]
fn ticks_before_ready_take_the_plain_path() {
    let mut p = player();
    assert_eq!(p.render_tick(FrameTiming::default()), TickOutcome::Plain);
    let _job = p.play(Some(StubSource::ok())).unwrap();
    assert_eq!(p.render_tick(FrameTiming::default()), TickOutcome::Plain);
    assert_eq!(p.driver().plain, 2);
    assert_eq!(p.driver().after, 2);
}

#[test]
fn render_current_reads_the_driver_clock() {
    let mut p = player();
    assert_eq!(p.render_current(), TickOutcome::Plain);
    assert_eq!(p.driver().plain, 1);
    assert_eq!(p.driver().after, 1);
}

#[test]
fn read_frame_requires_ready() {
    let p = player();
    assert!(matches!(p.read_frame(), Err(AlphaError::InvalidState(_))));
}

#[test]
fn clear_without_session_only_resets_the_driver() {
    let mut p = player();
    p.clear();
    assert_eq!(p.driver().cleared, 1);
    assert_eq!(p.state(), PlayerState::Uninitialized);
}

#[test]
fn observers_can_be_removed() {
    let mut p = player();
    let id = p.on_frame(|_| {});
    assert!(p.remove_observer(id));
    assert!(!p.remove_observer(id));
}

#[test]
fn config_defaults() {
    let cfg: PlayerConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, PlayerConfig::default());
    assert_eq!(cfg.fallback_fps, 30.0);
    assert_eq!(cfg.clear_rgba, [0.0; 4]);
}

#[test]
fn failed_session_build_installs_nothing() {
    let Some(ctx) = context() else { return };
    let mut p = player().with_context(ctx);
    p.play_blocking(StubSource::empty_overlay()).unwrap();

    assert_eq!(p.state(), PlayerState::Uninitialized);
    assert_eq!(p.mode(), PlaybackMode::Plain);
    assert!(p.session.is_none());
    assert_eq!(p.driver().started, 1);
    assert!(matches!(p.read_frame(), Err(AlphaError::InvalidState(_))));
}

#[test]
fn failed_reconfigure_keeps_the_ready_session() {
    let Some(ctx) = context() else { return };
    let mut p = player().with_context(ctx);
    p.play_blocking(StubSource::ok()).unwrap();
    assert_eq!(p.state(), PlayerState::Ready);

    p.play_blocking(StubSource::empty_overlay()).unwrap();
    assert_eq!(p.state(), PlayerState::Uninitialized);
    assert_eq!(p.mode(), PlaybackMode::Plain);
    assert!(p.session.is_some());

    p.play_blocking(StubSource::ok()).unwrap();
    assert_eq!(p.state(), PlayerState::Ready);
    assert_eq!(p.mode(), PlaybackMode::Composited);
}
