//! wgpu backend for [`GpuSurface`](triview_render::GpuSurface).
//!
//! # Invariants
//! - Draws are recorded between `clear` and `present` and submitted as one
//!   render pass; each draw sees the uniform values current when it was issued.
//! - A lost or outdated surface is reconfigured and the frame is skipped.

mod gpu;

pub use gpu::{WgpuSurface, align_to, vertex_attributes};
