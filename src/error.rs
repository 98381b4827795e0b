//! Graphics error types.

use std::fmt;

use crate::shader::ShaderStage;

/// Errors that can occur in the graphics system.
///
/// All construction-time failures (buffers, shaders, textures, vertex
/// arrays) are typed and recoverable so callers and tests can assert on
/// them without terminating the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to allocate a GPU resource (buffer, texture, program).
    ResourceAllocationFailed(String),
    /// A shader stage failed to compile. Carries the stage and the
    /// compiler diagnostics verbatim.
    ShaderCompileFailed {
        /// The stage that failed.
        stage: ShaderStage,
        /// Compiler diagnostic text.
        log: String,
    },
    /// The shader program failed to link.
    ShaderLinkFailed {
        /// Linker diagnostic text.
        log: String,
    },
    /// An asset (texture image) could not be loaded or decoded.
    AssetLoadFailed(String),
    /// An index buffer entry references a nonexistent vertex.
    IndexOutOfRange {
        /// The offending index value.
        index: u32,
        /// Number of vertices in the vertex buffer.
        vertex_count: u32,
    },
    /// An invalid parameter was provided.
    InvalidParameter(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceAllocationFailed(msg) => write!(f, "resource allocation failed: {msg}"),
            Self::ShaderCompileFailed { stage, log } => {
                write!(f, "{stage} shader compilation failed: {log}")
            }
            Self::ShaderLinkFailed { log } => write!(f, "shader program link failed: {log}"),
            Self::AssetLoadFailed(msg) => write!(f, "asset load failed: {msg}"),
            Self::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "index {index} out of range for vertex buffer of {vertex_count} vertices"
            ),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}
