//! Per-volume processing flow

pub mod volume_ctx;
pub mod volume_flow;

pub use volume_ctx::VolumeCtx;
pub use volume_flow::{VolumeFlow, VolumeStats};
