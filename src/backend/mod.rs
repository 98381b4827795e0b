//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction over the underlying
//! graphics API so the resource types above it never issue raw calls.
//!
//! # Available Backends
//!
//! - [`DummyBackend`] (always available): records every upload and draw
//!   call instead of touching a GPU, for testing and development
//! - `gl-backend` feature: [`gl::GlBackend`], real OpenGL via glow
//!
//! All backend operations may leave API binding state changed (bind,
//! act, leave bound); callers must not assume bindings are restored.

pub mod dummy;

#[cfg(feature = "gl-backend")]
pub mod gl;

pub use dummy::DummyBackend;

use crate::error::GraphicsError;
use crate::mesh::VertexLayout;
use crate::types::{BufferDescriptor, PrimitiveTopology, TextureDescriptor};

/// Handle to a backend buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u64);

/// Handle to a backend shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub(crate) u64);

/// Handle to a backend vertex array (attribute binding state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub(crate) u64);

/// Handle to a backend texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) u64);

/// A typed uniform value, uploaded by name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Boolean (uploaded as an integer 0/1).
    Bool(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// Two-component signed integer vector.
    IVec2([i32; 2]),
    /// 32-bit float.
    Float(f32),
    /// Three-component float vector.
    Vec3([f32; 3]),
    /// Four-component float vector.
    Vec4([f32; 4]),
    /// 4x4 float matrix, column-major.
    Mat4([f32; 16]),
}

/// A recorded draw command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DrawCall {
    /// Program in use for the draw.
    pub program: ProgramId,
    /// Vertex array providing geometry.
    pub vertex_array: VertexArrayId,
    /// Primitive topology.
    pub topology: PrimitiveTopology,
    /// Number of indices covered.
    pub index_count: u32,
    /// Number of instances (1 for non-instanced draws).
    pub instance_count: u32,
}

/// GPU backend trait abstracting the underlying graphics API.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Allocate a buffer sized to `data` and upload it immediately.
    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, GraphicsError>;

    /// Re-upload data into an existing buffer. Does not resize.
    fn write_buffer(&self, buffer: BufferId, offset: u64, data: &[u8])
        -> Result<(), GraphicsError>;

    /// Read data back from a buffer.
    fn read_buffer(&self, buffer: BufferId, offset: u64, size: u64) -> Vec<u8>;

    /// Free a buffer. Unknown handles are ignored.
    fn destroy_buffer(&self, buffer: BufferId);

    /// Create a vertex array binding the layout's attribute formats to
    /// the given vertex and index buffers.
    fn create_vertex_array(
        &self,
        layout: &VertexLayout,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
    ) -> Result<VertexArrayId, GraphicsError>;

    /// Query the layout bound to a vertex array, if the backend supports
    /// introspection. Returns `None` otherwise.
    fn query_vertex_layout(&self, vertex_array: VertexArrayId) -> Option<VertexLayout>;

    /// Free a vertex array. Unknown handles are ignored.
    fn destroy_vertex_array(&self, vertex_array: VertexArrayId);

    /// Compile and link a program from GLSL stage sources.
    fn create_program(
        &self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, GraphicsError>;

    /// Upload a uniform value by name. Names without a location in the
    /// linked program (optimized out) are a logged no-op.
    fn set_uniform(&self, program: ProgramId, name: &str, value: UniformValue);

    /// Bind a uniform block to a binding point, backed by a buffer.
    fn bind_uniform_block(&self, program: ProgramId, name: &str, binding: u32, buffer: BufferId);

    /// Free a program. Unknown handles are ignored.
    fn destroy_program(&self, program: ProgramId);

    /// Create a texture and upload decoded RGBA8 pixels.
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> Result<TextureId, GraphicsError>;

    /// Bind a texture to a texture unit.
    fn bind_texture(&self, texture: TextureId, unit: u32);

    /// Free a texture. Unknown handles are ignored.
    fn destroy_texture(&self, texture: TextureId);

    /// Issue one indexed draw covering `index_count` indices.
    fn draw_indexed(
        &self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        index_count: u32,
    );

    /// Issue one indexed, instanced draw producing `instance_count` copies.
    fn draw_indexed_instanced(
        &self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        index_count: u32,
        instance_count: u32,
    );
}
