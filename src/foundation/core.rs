/// Signed animation frame index.
///
/// Signed because a configured frame offset may push the time-paced index below zero;
/// such frames simply have no descriptor.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub i64);

impl FrameIndex {
    /// The index as an unsigned value, or `None` when negative.
    pub fn as_u64(self) -> Option<u64> {
        u64::try_from(self.0).ok()
    }
}

impl std::fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned rectangle in video-atlas pixel space (`x`, `y` = top-left corner).
///
/// Serialized as `[x, y, w, h]`, the layout used by animation descriptors.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct PixelRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl PixelRect {
    /// Build a rectangle from its corner and size.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Same size, moved by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// `true` when the rectangle lies inside `[0, width] x [0, height]`.
    pub fn fits_within(self, width: f64, height: f64) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.w >= 0.0
            && self.h >= 0.0
            && self.x + self.w <= width
            && self.y + self.h <= height
    }
}

impl From<[f64; 4]> for PixelRect {
    fn from([x, y, w, h]: [f64; 4]) -> Self {
        Self { x, y, w, h }
    }
}

impl From<PixelRect> for [f64; 4] {
    fn from(r: PixelRect) -> Self {
        [r.x, r.y, r.w, r.h]
    }
}

/// Normalized texture-space bounds with the vertical axis flipped
/// (`top > bottom` for a rectangle of positive height).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UvBounds {
    /// `u` of the left edge.
    pub left: f64,
    /// `u` of the right edge.
    pub right: f64,
    /// `v` of the bottom edge.
    pub bottom: f64,
    /// `v` of the top edge.
    pub top: f64,
}

impl UvBounds {
    /// `[left, right, bottom, top]` narrowed for GPU upload.
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.left as f32,
            self.right as f32,
            self.bottom as f32,
            self.top as f32,
        ]
    }
}
