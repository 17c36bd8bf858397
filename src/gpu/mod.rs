//! wgpu building blocks of the compositing renderer.

pub(crate) mod context;
pub(crate) mod coord;
pub(crate) mod geometry;
pub(crate) mod program;
pub(crate) mod shader;
pub(crate) mod target;
pub(crate) mod textures;
