use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    descriptor::{
        model::{FrameDescriptor, OverlayResource, Placement, SessionMetadata, VideoAtlasLayout},
        source::FrameSource,
    },
    foundation::{
        core::{FrameIndex, PixelRect},
        error::{AlphaError, AlphaResult},
    },
};

#[derive(Debug, serde::Deserialize)]
struct DescriptorDoc {
    info: InfoDoc,
    #[serde(default)]
    src: Vec<SrcDoc>,
    #[serde(default)]
    frame: Vec<FrameDoc>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoDoc {
    #[serde(default)]
    f: Option<u64>,
    w: u32,
    h: u32,
    #[serde(default)]
    fps: Option<f64>,
    video_w: u32,
    video_h: u32,
    rgb_frame: PixelRect,
    a_frame: PixelRect,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SrcDoc {
    src_id: String,
    #[serde(default)]
    src_tag: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct FrameDoc {
    i: u64,
    #[serde(default)]
    obj: Vec<ObjDoc>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjDoc {
    src_id: String,
    frame: PixelRect,
    m_frame: PixelRect,
}

#[derive(Clone, Debug)]
enum DescriptorInput {
    Path(PathBuf),
    Inline(String),
}

#[derive(Clone, Debug)]
enum ImageInput {
    Decoded(Arc<image::RgbaImage>),
    Path(PathBuf),
}

/// Frame descriptor source backed by the animation-descriptor JSON format
/// (`info` / `src` / `frame` sections).
///
/// Overlay bitmaps are supplied by the caller, keyed by the source tag (brackets
/// stripped, so `"[avatar]"` is keyed as `"avatar"`) or by the source id. Sources
/// without a supplied bitmap are not registered.
#[derive(Clone, Debug)]
pub struct JsonFrameSource {
    input: DescriptorInput,
    images: HashMap<String, ImageInput>,
    metadata: Option<SessionMetadata>,
    resources: Vec<OverlayResource>,
    frames: HashMap<u64, FrameDescriptor>,
}

impl JsonFrameSource {
    /// Read the descriptor from `path` during [`FrameSource::prepare`].
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::with_input(DescriptorInput::Path(path.into()))
    }

    /// Parse the descriptor from an in-memory JSON document.
    pub fn from_json_str(json: impl Into<String>) -> Self {
        Self::with_input(DescriptorInput::Inline(json.into()))
    }

    fn with_input(input: DescriptorInput) -> Self {
        Self {
            input,
            images: HashMap::new(),
            metadata: None,
            resources: Vec::new(),
            frames: HashMap::new(),
        }
    }

    /// Supply a decoded bitmap for the source with tag or id `key`.
    pub fn with_image(mut self, key: impl Into<String>, image: image::RgbaImage) -> Self {
        self.images
            .insert(key.into(), ImageInput::Decoded(Arc::new(image)));
        self
    }

    /// Supply a bitmap file for the source with tag or id `key`.
    ///
    /// Relative paths resolve against the descriptor file's directory.
    pub fn with_image_path(mut self, key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.images.insert(key.into(), ImageInput::Path(path.into()));
        self
    }

    /// Number of frames that carry at least one placement. `0` before `prepare`.
    pub fn annotated_frames(&self) -> usize {
        self.frames
            .values()
            .filter(|d| !d.placements.is_empty())
            .count()
    }

    fn base_dir(&self) -> &Path {
        match &self.input {
            DescriptorInput::Path(p) => p.parent().unwrap_or_else(|| Path::new(".")),
            DescriptorInput::Inline(_) => Path::new("."),
        }
    }

    fn read_doc(&self) -> AlphaResult<DescriptorDoc> {
        let text = match &self.input {
            DescriptorInput::Path(p) => std::fs::read_to_string(p).map_err(|e| {
                AlphaError::descriptor_parse(format!("read '{}': {e}", p.display()))
            })?,
            DescriptorInput::Inline(s) => s.clone(),
        };
        serde_json::from_str(&text)
            .map_err(|e| AlphaError::descriptor_parse(format!("descriptor JSON: {e}")))
    }

    fn image_for(&self, src: &SrcDoc) -> AlphaResult<Option<Arc<image::RgbaImage>>> {
        let by_tag = src
            .src_tag
            .as_deref()
            .map(|t| t.trim_start_matches('[').trim_end_matches(']'))
            .and_then(|t| self.images.get(t));
        let Some(input) = by_tag.or_else(|| self.images.get(&src.src_id)) else {
            return Ok(None);
        };

        match input {
            ImageInput::Decoded(img) => Ok(Some(img.clone())),
            ImageInput::Path(p) => {
                let path = if p.is_absolute() {
                    p.clone()
                } else {
                    self.base_dir().join(p)
                };
                let decoded = image::open(&path).map_err(|e| {
                    AlphaError::descriptor_parse(format!(
                        "decode source '{}' from '{}': {e}",
                        src.src_id,
                        path.display()
                    ))
                })?;
                Ok(Some(Arc::new(decoded.to_rgba8())))
            }
        }
    }
}

impl FrameSource for JsonFrameSource {
    #[tracing::instrument(skip(self))]
    fn prepare(&mut self) -> AlphaResult<()> {
        let doc = self.read_doc()?;

        let layout = VideoAtlasLayout {
            video_width: doc.info.video_w,
            video_height: doc.info.video_h,
            rgb_region: doc.info.rgb_frame,
            alpha_region: doc.info.a_frame,
        };
        layout.validate()?;

        if let Some(fps) = doc.info.fps
            && !(fps.is_finite() && fps > 0.0)
        {
            return Err(AlphaError::descriptor_parse(format!(
                "fps must be a positive number, got {fps}"
            )));
        }

        let mut resources = Vec::with_capacity(doc.src.len());
        for src in &doc.src {
            match self.image_for(src)? {
                Some(image) => resources.push(OverlayResource {
                    id: src.src_id.clone(),
                    image,
                }),
                None => tracing::debug!(src_id = %src.src_id, "no bitmap supplied; source skipped"),
            }
        }

        let mut frames = HashMap::with_capacity(doc.frame.len());
        for frame in doc.frame {
            let placements = frame
                .obj
                .into_iter()
                .map(|o| Placement {
                    source_id: o.src_id,
                    dest_rect: o.frame,
                    mask_rect: o.m_frame,
                })
                .collect();
            frames.insert(frame.i, FrameDescriptor { placements });
        }

        self.metadata = Some(SessionMetadata {
            layout,
            display_width: doc.info.w,
            display_height: doc.info.h,
            frame_rate: doc.info.fps,
            frame_count: doc.info.f,
        });
        self.resources = resources;
        self.frames = frames;
        tracing::debug!(
            sources = self.resources.len(),
            frames = self.frames.len(),
            "descriptor prepared"
        );
        Ok(())
    }

    fn metadata(&self) -> Option<&SessionMetadata> {
        self.metadata.as_ref()
    }

    fn resources(&self) -> &[OverlayResource] {
        &self.resources
    }

    fn placements_at(&self, frame: FrameIndex) -> Option<&FrameDescriptor> {
        let idx = frame.as_u64()?;
        self.frames
            .get(&idx)
            .filter(|d| !d.placements.is_empty())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/descriptor/json.rs"]
mod tests;
