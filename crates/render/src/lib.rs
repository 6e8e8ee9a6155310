//! Rendering: the backend-agnostic GPU interface, triangle meshes and the
//! per-frame render loop.
//!
//! # Invariants
//! - The render loop reads scene state through transforms; it never reaches
//!   into a graphics API directly, only through [`GpuSurface`].
//! - Every resource the loop creates is released exactly once on shutdown.
//!
//! [`RecordingSurface`] stands in for a real backend in tests and in the
//! headless simulator.

pub mod frame_loop;
pub mod mesh;
pub mod recording;
pub mod surface;
pub mod uniforms;

pub use frame_loop::{LoopState, RenderLoop, depth_remap};
pub use mesh::{FLOATS_PER_VERTEX, GpuMesh, TriangleMesh, Vertex};
pub use recording::{GpuCommand, RecordingSurface};
pub use surface::{
    BufferId, GpuSurface, ProgramId, RenderError, UniformLocation, VertexArrayId, VertexAttribute,
    VertexLayout,
};
pub use uniforms::{MAT4_SIZE, MODEL, PROJECTION, UniformBlock, VIEW};
