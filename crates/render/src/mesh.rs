use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::surface::{BufferId, GpuSurface, ProgramId, RenderError, VertexArrayId, VertexLayout};

/// Floats per interleaved vertex: xyz position then rgb color.
pub const FLOATS_PER_VERTEX: usize = 6;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);
const GREEN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const BLUE: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// A single colored triangle kept on the CPU.
///
/// The untransformed corner positions never change; [`TriangleMesh::build_vertices`]
/// regenerates the interleaved vertex data from them.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    positions: [Vec3; 3],
    colors: [Vec3; 3],
    vertices: Vec<Vertex>,
}

impl TriangleMesh {
    pub fn new(positions: [Vec3; 3], colors: [Vec3; 3]) -> Self {
        let mut mesh = Self {
            positions,
            colors,
            vertices: Vec::with_capacity(3),
        };
        mesh.build_vertices(&Mat4::IDENTITY);
        mesh
    }

    /// Apex up, red/green/blue corners.
    pub fn upright() -> Self {
        Self::new(
            [
                Vec3::new(-0.5, -0.5, 0.0),
                Vec3::new(0.5, -0.5, 0.0),
                Vec3::new(0.0, 0.5, 0.0),
            ],
            [RED, GREEN, BLUE],
        )
    }

    /// Apex down, red/green/blue corners.
    pub fn inverted() -> Self {
        Self::new(
            [
                Vec3::new(-0.5, 0.5, 0.0),
                Vec3::new(0.5, 0.5, 0.0),
                Vec3::new(0.0, -0.5, 0.0),
            ],
            [RED, GREEN, BLUE],
        )
    }

    /// Regenerate vertex data with `transform` baked into the positions.
    pub fn build_vertices(&mut self, transform: &Mat4) {
        self.vertices.clear();
        for (position, color) in self.positions.iter().zip(&self.colors) {
            let p = (*transform * position.extend(1.0)).truncate();
            self.vertices.push(Vertex {
                position: p.to_array(),
                color: color.to_array(),
            });
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn byte_len(&self) -> usize {
        self.vertices.len() * FLOATS_PER_VERTEX * std::mem::size_of::<f32>()
    }
}

/// A triangle mesh uploaded to a GPU surface.
///
/// Owns its buffer and vertex array; release them with [`GpuMesh::destroy`].
#[derive(Debug)]
pub struct GpuMesh {
    mesh: TriangleMesh,
    buffer: BufferId,
    vertex_array: VertexArrayId,
}

impl GpuMesh {
    pub fn upload(surface: &mut dyn GpuSurface, mesh: TriangleMesh) -> Result<Self, RenderError> {
        let buffer = surface.create_buffer()?;
        surface.upload(buffer, mesh.as_bytes())?;
        let vertex_array = surface.create_vertex_array(buffer, &VertexLayout::POSITION_COLOR)?;

        tracing::debug!(
            ?vertex_array,
            ?buffer,
            bytes = surface.buffer_size(buffer).unwrap_or(0),
            "uploaded triangle mesh"
        );

        Ok(Self {
            mesh,
            buffer,
            vertex_array,
        })
    }

    /// Bake `transform` into the vertex data and upload it again.
    pub fn rebuild(
        &mut self,
        surface: &mut dyn GpuSurface,
        transform: &Mat4,
    ) -> Result<(), RenderError> {
        self.mesh.build_vertices(transform);
        surface.upload(self.buffer, self.mesh.as_bytes())
    }

    pub fn draw(&self, surface: &mut dyn GpuSurface, program: ProgramId) -> Result<(), RenderError> {
        surface.draw_triangles(program, self.vertex_array, self.mesh.vertex_count())
    }

    pub fn destroy(self, surface: &mut dyn GpuSurface) {
        surface.delete_vertex_array(self.vertex_array);
        surface.delete_buffer(self.buffer);
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }
}
