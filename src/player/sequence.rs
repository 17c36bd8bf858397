use std::path::Path;

use anyhow::Context as _;

use crate::{
    foundation::error::{AlphaError, AlphaResult},
    player::driver::{FrameTiming, PlaybackDriver, PlaybackSettings},
};

/// Pull-style driver over already decoded atlas frames presented at a fixed rate.
///
/// Frame `i` is shown at `i / frame_rate` seconds. With looping enabled the
/// sequence restarts at frame 0 and the presented counter keeps counting.
#[derive(Debug, Clone)]
pub struct FrameSequenceDriver {
    frames: Vec<image::RgbaImage>,
    settings: PlaybackSettings,
    cursor: usize,
    current: Option<usize>,
    presented: u64,
    loops: u64,
    playing: bool,
    plain_frames: u64,
}

impl FrameSequenceDriver {
    /// Driver over `frames` with `settings`.
    pub fn new(frames: Vec<image::RgbaImage>, settings: PlaybackSettings) -> Self {
        Self {
            frames,
            settings,
            cursor: 0,
            current: None,
            presented: 0,
            loops: 0,
            playing: false,
            plain_frames: 0,
        }
    }

    /// Decode every PNG in `dir`, sorted by file name.
    pub fn from_dir(dir: &Path, settings: PlaybackSettings) -> AlphaResult<Self> {
        let mut paths = std::fs::read_dir(dir)
            .with_context(|| format!("read frame directory '{}'", dir.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("list frame directory '{}'", dir.display()))?;
        paths.retain(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("png"))
        });
        paths.sort();

        let frames = paths
            .iter()
            .map(|p| {
                image::open(p)
                    .map(|img| img.to_rgba8())
                    .with_context(|| format!("decode frame '{}'", p.display()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        tracing::debug!(count = frames.len(), dir = %dir.display(), "loaded frame sequence");
        Ok(Self::new(frames, settings))
    }

    /// Number of frames in the sequence.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when the sequence has no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Keep only the first `limit` frames.
    pub fn truncate(&mut self, limit: usize) {
        self.frames.truncate(limit);
    }

    /// Whether frames are being presented.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Completed loops since start.
    pub fn loops(&self) -> u64 {
        self.loops
    }

    /// Frames that went through the plain path.
    pub fn plain_frames(&self) -> u64 {
        self.plain_frames
    }

    /// Replace the playback settings.
    pub fn set_settings(&mut self, settings: PlaybackSettings) {
        self.settings = settings;
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.current = None;
        self.presented = 0;
        self.loops = 0;
        self.playing = false;
    }
}

impl PlaybackDriver for FrameSequenceDriver {
    fn prepare_media(&mut self) -> AlphaResult<()> {
        if self.frames.is_empty() {
            return Err(AlphaError::config("frame sequence is empty"));
        }
        self.reset();
        Ok(())
    }

    fn start(&mut self) -> AlphaResult<()> {
        if self.frames.is_empty() {
            return Err(AlphaError::config("frame sequence is empty"));
        }
        self.playing = true;
        Ok(())
    }

    fn current_time_secs(&self) -> f64 {
        let index = self.current.unwrap_or(self.cursor);
        index as f64 / self.settings.frame_rate
    }

    fn frames_presented(&self) -> u64 {
        self.presented
    }

    fn settings(&self) -> PlaybackSettings {
        self.settings
    }

    fn set_frame_rate(&mut self, fps: f64) {
        if fps > 0.0 {
            self.settings.frame_rate = fps;
        }
    }

    fn current_frame(&self) -> Option<&image::RgbaImage> {
        self.frames.get(self.current?)
    }

    fn draw_plain(&mut self, _timing: &FrameTiming) {
        self.plain_frames += 1;
    }

    fn after_draw(&mut self, _timing: &FrameTiming) {
        if self.current.is_some() {
            self.cursor += 1;
        }
    }

    fn poll_frame(&mut self) -> Option<FrameTiming> {
        if !self.playing {
            return None;
        }
        if self.cursor >= self.frames.len() {
            if self.settings.loop_enabled && !self.frames.is_empty() {
                self.cursor = 0;
                self.loops += 1;
            } else {
                self.playing = false;
                tracing::debug!(presented = self.presented, "frame sequence ended");
                return None;
            }
        }
        self.current = Some(self.cursor);
        self.presented += 1;
        Some(FrameTiming {
            time_secs: self.current_time_secs(),
            presented_frames: self.presented,
        })
    }

    fn clear(&mut self) {
        self.reset();
    }

    fn destroy(&mut self) {
        self.reset();
        self.plain_frames = 0;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/player/sequence.rs"]
mod tests;
