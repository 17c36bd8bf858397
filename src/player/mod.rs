//! Playback-facing side: driver interface, observers and the lifecycle manager.

pub(crate) mod driver;
pub(crate) mod events;
pub(crate) mod lifecycle;
pub(crate) mod sequence;
