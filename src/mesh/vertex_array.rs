//! Drawable vertex arrays.
//!
//! A [`VertexArray`] ties together a shader program, a vertex layout,
//! a vertex buffer and an index buffer, plus an optional per-instance
//! uniform buffer for instanced draws. It is created through
//! [`Device::create_vertex_array`](crate::device::Device::create_vertex_array).

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytemuck::Pod;
use static_assertions::assert_impl_all;

use crate::backend::{GpuBackend, VertexArrayId};
use crate::error::GraphicsError;
use crate::resources::Buffer;
use crate::shader::ShaderProgram;
use crate::types::{BufferUsage, PrimitiveTopology};

use super::VertexLayout;

/// A drawable piece of geometry.
///
/// Draw calls always cover the full index buffer. Releasing frees the
/// backend vertex array and the buffers it owns; a second release is a
/// no-op.
pub struct VertexArray {
    backend: Arc<dyn GpuBackend>,
    shader: Arc<ShaderProgram>,
    layout: Arc<VertexLayout>,
    topology: PrimitiveTopology,
    vertex_buffer: Arc<Buffer>,
    index_buffer: Arc<Buffer>,
    instance_buffer: Option<Arc<Buffer>>,
    id: VertexArrayId,
    vertex_count: u32,
    index_count: u32,
    released: AtomicBool,
}

impl VertexArray {
    pub(crate) fn new(
        backend: Arc<dyn GpuBackend>,
        shader: Arc<ShaderProgram>,
        layout: Arc<VertexLayout>,
        topology: PrimitiveTopology,
        vertex_buffer: Arc<Buffer>,
        index_buffer: Arc<Buffer>,
        vertex_count: u32,
        index_count: u32,
    ) -> Result<Self, GraphicsError> {
        let id =
            backend.create_vertex_array(&layout, vertex_buffer.id(), index_buffer.id())?;
        log::trace!(
            "Created vertex array {:?} ({} vertices, {} indices, {:?})",
            id,
            vertex_count,
            index_count,
            topology
        );
        Ok(Self {
            backend,
            shader,
            layout,
            topology,
            vertex_buffer,
            index_buffer,
            instance_buffer: None,
            id,
            vertex_count,
            index_count,
            released: AtomicBool::new(false),
        })
    }

    /// Get the backend handle of this vertex array.
    pub fn id(&self) -> VertexArrayId {
        self.id
    }

    /// Get the shader program used for draws.
    pub fn shader(&self) -> &Arc<ShaderProgram> {
        &self.shader
    }

    /// Get the vertex layout.
    pub fn layout(&self) -> &Arc<VertexLayout> {
        &self.layout
    }

    /// Get the primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Get the number of indices covered by each draw.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Whether the vertex array has been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Attach a per-instance uniform buffer for instanced draws.
    ///
    /// The buffer must carry `UNIFORM` usage.
    pub fn set_instance_buffer(&mut self, buffer: Arc<Buffer>) -> Result<(), GraphicsError> {
        if !buffer.descriptor().usage.contains(BufferUsage::UNIFORM) {
            return Err(GraphicsError::InvalidParameter(
                "instance buffer lacks UNIFORM usage".to_string(),
            ));
        }
        self.instance_buffer = Some(buffer);
        Ok(())
    }

    /// Get the attached instance buffer, if any.
    pub fn instance_buffer(&self) -> Option<&Arc<Buffer>> {
        self.instance_buffer.as_ref()
    }

    /// Re-upload per-instance records into the attached instance buffer.
    pub fn update_instance_data<T: Pod>(&self, records: &[T]) -> Result<(), GraphicsError> {
        let buffer = self.instance_buffer.as_ref().ok_or_else(|| {
            GraphicsError::InvalidParameter(
                "vertex array has no instance buffer attached".to_string(),
            )
        })?;
        buffer.update(records)
    }

    /// Issue one indexed draw covering the full index buffer.
    pub fn draw(&self) {
        if self.is_released() {
            log::warn!("Drawing released vertex array {:?}", self.id);
            return;
        }
        self.backend
            .draw_indexed(self.shader.id(), self.id, self.topology, self.index_count);
    }

    /// Issue one instanced draw producing `instances` copies.
    pub fn draw_instanced(&self, instances: u32) {
        if self.is_released() {
            log::warn!("Drawing released vertex array {:?}", self.id);
            return;
        }
        self.backend.draw_indexed_instanced(
            self.shader.id(),
            self.id,
            self.topology,
            self.index_count,
            instances,
        );
    }

    /// Free the backend vertex array and its buffers. Safe to call more
    /// than once.
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.backend.destroy_vertex_array(self.id);
            self.vertex_buffer.release();
            self.index_buffer.release();
            if let Some(instance_buffer) = &self.instance_buffer {
                instance_buffer.release();
            }
        }
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for VertexArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexArray")
            .field("id", &self.id)
            .field("topology", &self.topology)
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .field("released", &self.is_released())
            .finish()
    }
}

assert_impl_all!(VertexArray: Send, Sync);
