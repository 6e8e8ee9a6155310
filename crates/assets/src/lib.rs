//! Shader sources: the two text files the demos compile at startup.
//!
//! A missing, unreadable or empty file is a startup failure; nothing here
//! retries or falls back silently. The default pair is also embedded for
//! headless runs that have no working directory to read from.

use std::path::{Path, PathBuf};

/// Default vertex shader, identical to `shaders/vertex.wgsl`.
pub const BUILTIN_VERTEX: &str = include_str!("../../../shaders/vertex.wgsl");
/// Default fragment shader, identical to `shaders/fragment.wgsl`.
pub const BUILTIN_FRAGMENT: &str = include_str!("../../../shaders/fragment.wgsl");

/// Which half of the program a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {stage} shader {path}: {source}")]
    Io {
        stage: ShaderStage,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{stage} shader {path} is empty")]
    Empty { stage: ShaderStage, path: PathBuf },
}

/// Vertex and fragment source text, read fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// The embedded default pair.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_VERTEX, BUILTIN_FRAGMENT)
    }

    /// Read both files.
    pub fn load(
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, AssetError> {
        let vertex = read_stage(ShaderStage::Vertex, vertex_path.as_ref())?;
        let fragment = read_stage(ShaderStage::Fragment, fragment_path.as_ref())?;
        Ok(Self { vertex, fragment })
    }
}

fn read_stage(stage: ShaderStage, path: &Path) -> Result<String, AssetError> {
    let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        stage,
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Err(AssetError::Empty {
            stage,
            path: path.to_path_buf(),
        });
    }
    tracing::debug!("read {stage} shader {} ({} bytes)", path.display(), text.len());
    Ok(text)
}
