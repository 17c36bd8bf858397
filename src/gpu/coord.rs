use crate::foundation::core::{PixelRect, UvBounds};

/// Map a pixel rectangle of a `vw x vh` atlas into normalized texture space.
///
/// The vertical axis is flipped: pixel row 0 is `v = 1`. Inputs are not clamped.
pub fn compute_coord(rect: PixelRect, vw: f64, vh: f64) -> UvBounds {
    UvBounds {
        left: rect.x / vw,
        right: (rect.x + rect.w) / vw,
        bottom: (vh - rect.y - rect.h) / vh,
        top: (vh - rect.y) / vh,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/coord.rs"]
mod tests;
