use glam::Mat4;
use wgpu::naga;

use crate::surface::{RenderError, UniformLocation};

pub const MODEL: &str = "model";
pub const VIEW: &str = "view";
pub const PROJECTION: &str = "projection";

/// Bytes occupied by one 4x4 f32 matrix.
pub const MAT4_SIZE: u64 = 64;

/// Parse WGSL into a naga module, reporting errors with source context.
pub fn parse_wgsl(source: &str) -> Result<naga::Module, RenderError> {
    naga::front::wgsl::parse_str(source)
        .map_err(|e| RenderError::ShaderCompile(e.emit_to_string(source)))
}

/// Whether the module declares an entry point for `stage`.
pub fn has_entry_point(module: &naga::Module, stage: naga::ShaderStage) -> bool {
    module.entry_points.iter().any(|ep| ep.stage == stage)
}

fn is_mat4(inner: &naga::TypeInner) -> bool {
    matches!(
        inner,
        naga::TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if *scalar == naga::Scalar::F32
    )
}

#[derive(Debug, Clone, PartialEq)]
struct MatrixField {
    name: String,
    offset: u32,
    value: Mat4,
}

/// The matrix uniforms a vertex program declares, read from its
/// `var<uniform>` binding.
///
/// Locations index the matrix members in declaration order. Each matrix is
/// packed at the byte offset the WGSL layout rules give it; other members of
/// the block stay zeroed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniformBlock {
    group: u32,
    binding: u32,
    size: u32,
    fields: Vec<MatrixField>,
}

impl UniformBlock {
    pub fn from_source(vertex_source: &str) -> Result<Self, RenderError> {
        Ok(Self::from_module(&parse_wgsl(vertex_source)?))
    }

    /// Reflect the first uniform variable of `module`. A module with no
    /// uniform variable gives an empty block.
    pub fn from_module(module: &naga::Module) -> Self {
        let Some(var) = module
            .global_variables
            .iter()
            .map(|(_, var)| var)
            .find(|var| var.space == naga::AddressSpace::Uniform)
        else {
            return Self::default();
        };

        let (group, binding) = var
            .binding
            .as_ref()
            .map(|b| (b.group, b.binding))
            .unwrap_or((0, 0));

        let mut block = Self {
            group,
            binding,
            ..Self::default()
        };
        match &module.types[var.ty].inner {
            naga::TypeInner::Struct { members, span } => {
                block.size = *span;
                block.fields = members
                    .iter()
                    .filter(|m| is_mat4(&module.types[m.ty].inner))
                    .filter_map(|m| {
                        Some(MatrixField {
                            name: m.name.clone()?,
                            offset: m.offset,
                            value: Mat4::IDENTITY,
                        })
                    })
                    .collect();
            }
            inner if is_mat4(inner) => {
                block.size = MAT4_SIZE as u32;
                if let Some(name) = var.name.clone() {
                    block.fields.push(MatrixField {
                        name,
                        offset: 0,
                        value: Mat4::IDENTITY,
                    });
                }
            }
            _ => {}
        }
        block
    }

    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(|i| UniformLocation(i as u32))
    }

    /// Store a value; false when the location is out of range.
    pub fn set(&mut self, location: UniformLocation, value: Mat4) -> bool {
        match self.fields.get_mut(location.0 as usize) {
            Some(field) => {
                field.value = value;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, location: UniformLocation) -> Option<&Mat4> {
        self.fields.get(location.0 as usize).map(|f| &f.value)
    }

    /// Byte offset of a matrix inside the uniform block.
    pub fn offset(&self, location: UniformLocation) -> Option<u32> {
        self.fields.get(location.0 as usize).map(|f| f.offset)
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn binding(&self) -> u32 {
        self.binding
    }

    /// Number of matrix uniforms.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Size of the whole uniform block in bytes; 0 when the program has none.
    pub fn byte_size(&self) -> u64 {
        self.size as u64
    }

    /// The block laid out as the shader sees it.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.size as usize];
        for field in &self.fields {
            let cols = field.value.to_cols_array();
            let src: &[u8] = bytemuck::cast_slice(&cols);
            let start = field.offset as usize;
            if let Some(dst) = bytes.get_mut(start..start + src.len()) {
                dst.copy_from_slice(src);
            }
        }
        bytes
    }
}
