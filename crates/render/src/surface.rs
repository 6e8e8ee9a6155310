use glam::Mat4;

use crate::frame_loop::LoopState;

/// Handle to a GPU vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Handle to a buffer bound to a vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayId(pub u32);

/// Handle to a compiled vertex + fragment program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Slot of a named 4x4-matrix uniform inside a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// Errors from GPU operations and the render loop.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),
    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferId),
    #[error("unknown vertex array {0:?}")]
    UnknownVertexArray(VertexArrayId),
    #[error("unknown program {0:?}")]
    UnknownProgram(ProgramId),
    #[error("uniform location {location:?} out of range for program {program:?}")]
    UnknownUniform {
        program: ProgramId,
        location: UniformLocation,
    },
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    Device(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("render loop is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: LoopState,
        actual: LoopState,
    },
}

/// One float attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    /// Number of f32 components.
    pub components: u32,
    /// Byte offset from the start of the vertex.
    pub offset: u64,
}

/// Interleaved vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: &'static [VertexAttribute],
}

impl VertexLayout {
    /// Three position floats then three color floats, 24 bytes per vertex.
    pub const POSITION_COLOR: VertexLayout = VertexLayout {
        stride: 24,
        attributes: &[
            VertexAttribute {
                location: 0,
                components: 3,
                offset: 0,
            },
            VertexAttribute {
                location: 1,
                components: 3,
                offset: 12,
            },
        ],
    };
}

/// The graphics-context collaborator the render loop drives.
///
/// This is the whole operation set the demos need; nothing above this trait
/// knows which graphics API sits underneath. Resources are owned by the
/// caller and must be released exactly once with the matching `delete_*`.
pub trait GpuSurface {
    fn create_buffer(&mut self) -> Result<BufferId, RenderError>;

    /// Replace the whole contents of `buffer` with `bytes`.
    fn upload(&mut self, buffer: BufferId, bytes: &[u8]) -> Result<(), RenderError>;

    /// Size in bytes of the data last uploaded to `buffer`.
    fn buffer_size(&self, buffer: BufferId) -> Option<u64>;

    fn create_vertex_array(
        &mut self,
        buffer: BufferId,
        layout: &VertexLayout,
    ) -> Result<VertexArrayId, RenderError>;

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, RenderError>;

    /// Location of a named matrix uniform, or `None` when the program does
    /// not declare it.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn set_uniform_mat4(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        value: &Mat4,
    ) -> Result<(), RenderError>;

    /// Start a new frame cleared to `color` (RGBA).
    fn clear(&mut self, color: [f32; 4]);

    /// Draw `vertex_count` vertices as a triangle list with the program's
    /// current uniform values.
    fn draw_triangles(
        &mut self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        vertex_count: u32,
    ) -> Result<(), RenderError>;

    /// Show everything drawn since the last clear.
    fn present(&mut self) -> Result<(), RenderError>;

    fn delete_buffer(&mut self, buffer: BufferId);

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);

    fn delete_program(&mut self, program: ProgramId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_color_layout() {
        let layout = VertexLayout::POSITION_COLOR;
        assert_eq!(layout.stride, 24);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[1].offset, 12);
        let covered: u64 = layout
            .attributes
            .iter()
            .map(|a| a.components as u64 * 4)
            .sum();
        assert_eq!(covered, layout.stride);
    }

    #[test]
    fn error_messages() {
        let e = RenderError::UnknownBuffer(BufferId(7));
        assert_eq!(e.to_string(), "unknown buffer BufferId(7)");
        let e = RenderError::InvalidState {
            expected: LoopState::Running,
            actual: LoopState::Init,
        };
        assert!(e.to_string().contains("expected Running"));
    }
}
