use glam::Mat4;
use std::collections::BTreeMap;
use wgpu::naga;

use crate::surface::{
    BufferId, GpuSurface, ProgramId, RenderError, UniformLocation, VertexArrayId, VertexLayout,
};
use crate::uniforms::{UniformBlock, has_entry_point, parse_wgsl};

/// Every call a [`RecordingSurface`] received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateBuffer(BufferId),
    Upload { buffer: BufferId, bytes: usize },
    CreateVertexArray { vertex_array: VertexArrayId, buffer: BufferId },
    CompileProgram(ProgramId),
    SetUniform {
        program: ProgramId,
        location: UniformLocation,
        value: Mat4,
    },
    Clear([f32; 4]),
    Draw {
        program: ProgramId,
        vertex_array: VertexArrayId,
        vertex_count: u32,
    },
    Present,
    DeleteBuffer(BufferId),
    DeleteVertexArray(VertexArrayId),
    DeleteProgram(ProgramId),
}

/// In-memory GPU surface that records commands instead of drawing.
///
/// Stands in for a real backend in the headless simulator and in tests.
/// It keeps enough state to answer buffer-size and uniform queries and to
/// tell whether every resource was released exactly once.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    next_id: u32,
    buffers: BTreeMap<BufferId, Vec<u8>>,
    vertex_arrays: BTreeMap<VertexArrayId, BufferId>,
    programs: BTreeMap<ProgramId, UniformBlock>,
    commands: Vec<GpuCommand>,
    frames_presented: u64,
    stale_deletes: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drop the recorded command list, keeping resource state.
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn buffer_data(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    /// Current value of a program's matrix uniform.
    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<Mat4> {
        let block = self.programs.get(&program)?;
        block.get(block.location(name)?).copied()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Buffers, vertex arrays and programs not yet deleted.
    pub fn live_resources(&self) -> usize {
        self.buffers.len() + self.vertex_arrays.len() + self.programs.len()
    }

    /// Deletes of handles that were never created or already deleted.
    pub fn stale_deletes(&self) -> usize {
        self.stale_deletes
    }

    fn stale_delete(&mut self, what: &str) {
        tracing::warn!("delete of unknown {what}");
        self.stale_deletes += 1;
    }
}

impl GpuSurface for RecordingSurface {
    fn create_buffer(&mut self) -> Result<BufferId, RenderError> {
        let id = BufferId(self.next_id());
        self.buffers.insert(id, Vec::new());
        self.commands.push(GpuCommand::CreateBuffer(id));
        Ok(id)
    }

    fn upload(&mut self, buffer: BufferId, bytes: &[u8]) -> Result<(), RenderError> {
        let data = self
            .buffers
            .get_mut(&buffer)
            .ok_or(RenderError::UnknownBuffer(buffer))?;
        data.clear();
        data.extend_from_slice(bytes);
        self.commands.push(GpuCommand::Upload {
            buffer,
            bytes: bytes.len(),
        });
        Ok(())
    }

    fn buffer_size(&self, buffer: BufferId) -> Option<u64> {
        self.buffers.get(&buffer).map(|b| b.len() as u64)
    }

    fn create_vertex_array(
        &mut self,
        buffer: BufferId,
        _layout: &VertexLayout,
    ) -> Result<VertexArrayId, RenderError> {
        if !self.buffers.contains_key(&buffer) {
            return Err(RenderError::UnknownBuffer(buffer));
        }
        let id = VertexArrayId(self.next_id());
        self.vertex_arrays.insert(id, buffer);
        self.commands.push(GpuCommand::CreateVertexArray {
            vertex_array: id,
            buffer,
        });
        Ok(id)
    }

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, RenderError> {
        let vertex_module = parse_wgsl(vertex)?;
        if !has_entry_point(&vertex_module, naga::ShaderStage::Vertex) {
            return Err(RenderError::ShaderCompile(
                "vertex source has no @vertex entry point".into(),
            ));
        }
        let fragment_module = parse_wgsl(fragment)?;
        if !has_entry_point(&fragment_module, naga::ShaderStage::Fragment) {
            return Err(RenderError::ShaderCompile(
                "fragment source has no @fragment entry point".into(),
            ));
        }
        let id = ProgramId(self.next_id());
        self.programs
            .insert(id, UniformBlock::from_module(&vertex_module));
        self.commands.push(GpuCommand::CompileProgram(id));
        Ok(id)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.programs.get(&program)?.location(name)
    }

    fn set_uniform_mat4(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        value: &Mat4,
    ) -> Result<(), RenderError> {
        let block = self
            .programs
            .get_mut(&program)
            .ok_or(RenderError::UnknownProgram(program))?;
        if !block.set(location, *value) {
            return Err(RenderError::UnknownUniform { program, location });
        }
        self.commands.push(GpuCommand::SetUniform {
            program,
            location,
            value: *value,
        });
        Ok(())
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(GpuCommand::Clear(color));
    }

    fn draw_triangles(
        &mut self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        vertex_count: u32,
    ) -> Result<(), RenderError> {
        if !self.programs.contains_key(&program) {
            return Err(RenderError::UnknownProgram(program));
        }
        if !self.vertex_arrays.contains_key(&vertex_array) {
            return Err(RenderError::UnknownVertexArray(vertex_array));
        }
        self.commands.push(GpuCommand::Draw {
            program,
            vertex_array,
            vertex_count,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.frames_presented += 1;
        self.commands.push(GpuCommand::Present);
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_none() {
            self.stale_delete("buffer");
        }
        self.commands.push(GpuCommand::DeleteBuffer(buffer));
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if self.vertex_arrays.remove(&vertex_array).is_none() {
            self.stale_delete("vertex array");
        }
        self.commands.push(GpuCommand::DeleteVertexArray(vertex_array));
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program).is_none() {
            self.stale_delete("program");
        }
        self.commands.push(GpuCommand::DeleteProgram(program));
    }
}
