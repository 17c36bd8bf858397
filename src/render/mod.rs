//! Per-frame compositing on top of the GPU building blocks.

pub(crate) mod clock;
pub(crate) mod compositor;
pub(crate) mod packing;
pub(crate) mod session;
