//! Dummy backend that records commands instead of touching a GPU.
//!
//! Every upload, uniform and draw call is kept in memory, so tests can
//! assert on what would have been submitted. Also useful when running
//! headless.

use std::collections::HashMap;
use std::sync::RwLock;

use static_assertions::assert_impl_all;

use crate::error::GraphicsError;
use crate::mesh::VertexLayout;
use crate::types::{BufferDescriptor, PrimitiveTopology, TextureDescriptor};

use super::{
    BufferId, DrawCall, GpuBackend, ProgramId, TextureId, UniformValue, VertexArrayId,
};

#[derive(Debug)]
struct DummyBuffer {
    descriptor: BufferDescriptor,
    contents: Vec<u8>,
}

#[derive(Debug)]
struct DummyVertexArray {
    layout: VertexLayout,
    #[allow(dead_code)]
    vertex_buffer: BufferId,
    #[allow(dead_code)]
    index_buffer: BufferId,
}

#[derive(Debug, Default)]
struct DummyProgram {
    uniforms: HashMap<String, UniformValue>,
    uniform_blocks: HashMap<String, (u32, BufferId)>,
}

#[derive(Debug)]
struct DummyTexture {
    descriptor: TextureDescriptor,
    #[allow(dead_code)]
    pixels: Vec<u8>,
}

#[derive(Debug, Default)]
struct DummyState {
    next_id: u64,
    buffers: HashMap<u64, DummyBuffer>,
    vertex_arrays: HashMap<u64, DummyVertexArray>,
    programs: HashMap<u64, DummyProgram>,
    textures: HashMap<u64, DummyTexture>,
    bound_textures: HashMap<u32, TextureId>,
    draw_calls: Vec<DrawCall>,
}

impl DummyState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A backend that records all commands in memory.
#[derive(Debug, Default)]
pub struct DummyBackend {
    state: RwLock<DummyState>,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current contents of a buffer, or `None` after release.
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<Vec<u8>> {
        let state = self.state.read().unwrap();
        state.buffers.get(&buffer.0).map(|b| b.contents.clone())
    }

    /// Get all draw calls recorded so far, in submission order.
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.read().unwrap().draw_calls.clone()
    }

    /// Forget all recorded draw calls.
    pub fn clear_draw_calls(&self) {
        self.state.write().unwrap().draw_calls.clear();
    }

    /// Get the last value uploaded for a uniform, if any.
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        let state = self.state.read().unwrap();
        state
            .programs
            .get(&program.0)
            .and_then(|p| p.uniforms.get(name).copied())
    }

    /// Get the binding point and buffer bound to a uniform block, if any.
    pub fn uniform_block_binding(&self, program: ProgramId, name: &str) -> Option<(u32, BufferId)> {
        let state = self.state.read().unwrap();
        state
            .programs
            .get(&program.0)
            .and_then(|p| p.uniform_blocks.get(name).copied())
    }

    /// Get the texture bound to a texture unit, if any.
    pub fn bound_texture(&self, unit: u32) -> Option<TextureId> {
        self.state.read().unwrap().bound_textures.get(&unit).copied()
    }

    /// Get the number of live (not yet destroyed) buffers.
    pub fn live_buffer_count(&self) -> usize {
        self.state.read().unwrap().buffers.len()
    }

    /// Get the number of live vertex arrays.
    pub fn live_vertex_array_count(&self) -> usize {
        self.state.read().unwrap().vertex_arrays.len()
    }

    /// Get the number of live programs.
    pub fn live_program_count(&self) -> usize {
        self.state.read().unwrap().programs.len()
    }

    /// Get the number of live textures.
    pub fn live_texture_count(&self) -> usize {
        self.state.read().unwrap().textures.len()
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, GraphicsError> {
        if descriptor.size != data.len() as u64 {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer descriptor size {} does not match data length {}",
                descriptor.size,
                data.len()
            )));
        }
        let mut state = self.state.write().unwrap();
        let id = state.allocate_id();
        state.buffers.insert(
            id,
            DummyBuffer {
                descriptor: descriptor.clone(),
                contents: data.to_vec(),
            },
        );
        Ok(BufferId(id))
    }

    fn write_buffer(
        &self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let mut state = self.state.write().unwrap();
        let entry = state.buffers.get_mut(&buffer.0).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("write to unknown buffer {:?}", buffer))
        })?;
        let end = offset as usize + data.len();
        if end > entry.descriptor.size as usize {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at offset {} exceeds buffer size {}",
                data.len(),
                offset,
                entry.descriptor.size
            )));
        }
        entry.contents[offset as usize..end].copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&self, buffer: BufferId, offset: u64, size: u64) -> Vec<u8> {
        let state = self.state.read().unwrap();
        match state.buffers.get(&buffer.0) {
            Some(entry) => {
                let len = entry.contents.len();
                let start = (offset as usize).min(len);
                let end = ((offset + size) as usize).min(len);
                entry.contents[start..end].to_vec()
            }
            None => Vec::new(),
        }
    }

    fn destroy_buffer(&self, buffer: BufferId) {
        let mut state = self.state.write().unwrap();
        if state.buffers.remove(&buffer.0).is_none() {
            log::warn!("Destroying unknown buffer {:?}", buffer);
        }
    }

    fn create_vertex_array(
        &self,
        layout: &VertexLayout,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
    ) -> Result<VertexArrayId, GraphicsError> {
        let mut state = self.state.write().unwrap();
        if !state.buffers.contains_key(&vertex_buffer.0) {
            return Err(GraphicsError::InvalidParameter(format!(
                "vertex array references unknown vertex buffer {:?}",
                vertex_buffer
            )));
        }
        if !state.buffers.contains_key(&index_buffer.0) {
            return Err(GraphicsError::InvalidParameter(format!(
                "vertex array references unknown index buffer {:?}",
                index_buffer
            )));
        }
        let id = state.allocate_id();
        state.vertex_arrays.insert(
            id,
            DummyVertexArray {
                layout: layout.clone(),
                vertex_buffer,
                index_buffer,
            },
        );
        Ok(VertexArrayId(id))
    }

    fn query_vertex_layout(&self, vertex_array: VertexArrayId) -> Option<VertexLayout> {
        let state = self.state.read().unwrap();
        state
            .vertex_arrays
            .get(&vertex_array.0)
            .map(|va| va.layout.clone())
    }

    fn destroy_vertex_array(&self, vertex_array: VertexArrayId) {
        let mut state = self.state.write().unwrap();
        if state.vertex_arrays.remove(&vertex_array.0).is_none() {
            log::warn!("Destroying unknown vertex array {:?}", vertex_array);
        }
    }

    fn create_program(
        &self,
        _vertex_source: &str,
        _fragment_source: &str,
    ) -> Result<ProgramId, GraphicsError> {
        let mut state = self.state.write().unwrap();
        let id = state.allocate_id();
        state.programs.insert(id, DummyProgram::default());
        Ok(ProgramId(id))
    }

    fn set_uniform(&self, program: ProgramId, name: &str, value: UniformValue) {
        let mut state = self.state.write().unwrap();
        match state.programs.get_mut(&program.0) {
            Some(entry) => {
                entry.uniforms.insert(name.to_string(), value);
            }
            None => log::warn!("Setting uniform '{}' on unknown program {:?}", name, program),
        }
    }

    fn bind_uniform_block(&self, program: ProgramId, name: &str, binding: u32, buffer: BufferId) {
        let mut state = self.state.write().unwrap();
        match state.programs.get_mut(&program.0) {
            Some(entry) => {
                entry
                    .uniform_blocks
                    .insert(name.to_string(), (binding, buffer));
            }
            None => log::warn!(
                "Binding uniform block '{}' on unknown program {:?}",
                name,
                program
            ),
        }
    }

    fn destroy_program(&self, program: ProgramId) {
        let mut state = self.state.write().unwrap();
        if state.programs.remove(&program.0).is_none() {
            log::warn!("Destroying unknown program {:?}", program);
        }
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> Result<TextureId, GraphicsError> {
        if descriptor.byte_size() != pixels.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture of {}x{} expects {} bytes, got {}",
                descriptor.width,
                descriptor.height,
                descriptor.byte_size(),
                pixels.len()
            )));
        }
        let mut state = self.state.write().unwrap();
        let id = state.allocate_id();
        state.textures.insert(
            id,
            DummyTexture {
                descriptor: descriptor.clone(),
                pixels: pixels.to_vec(),
            },
        );
        Ok(TextureId(id))
    }

    fn bind_texture(&self, texture: TextureId, unit: u32) {
        let mut state = self.state.write().unwrap();
        if !state.textures.contains_key(&texture.0) {
            log::warn!("Binding unknown texture {:?}", texture);
            return;
        }
        state.bound_textures.insert(unit, texture);
    }

    fn destroy_texture(&self, texture: TextureId) {
        let mut state = self.state.write().unwrap();
        if state.textures.remove(&texture.0).is_none() {
            log::warn!("Destroying unknown texture {:?}", texture);
        }
        state.bound_textures.retain(|_, bound| *bound != texture);
    }

    fn draw_indexed(
        &self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        index_count: u32,
    ) {
        self.draw_indexed_instanced(program, vertex_array, topology, index_count, 1);
    }

    fn draw_indexed_instanced(
        &self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        index_count: u32,
        instance_count: u32,
    ) {
        let mut state = self.state.write().unwrap();
        state.draw_calls.push(DrawCall {
            program,
            vertex_array,
            topology,
            index_count,
            instance_count,
        });
    }
}

assert_impl_all!(DummyBackend: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BufferUsage;

    fn vertex_descriptor(size: u64) -> BufferDescriptor {
        BufferDescriptor::new(size, BufferUsage::VERTEX)
    }

    #[test]
    fn test_buffer_upload_and_readback() {
        let backend = DummyBackend::new();
        let data = [1u8, 2, 3, 4];
        let buffer = backend
            .create_buffer(&vertex_descriptor(4), &data)
            .unwrap();
        assert_eq!(backend.buffer_contents(buffer).unwrap(), data);
        assert_eq!(backend.read_buffer(buffer, 1, 2), vec![2, 3]);
    }

    #[test]
    fn test_read_buffer_clamps_out_of_range_offsets() {
        let backend = DummyBackend::new();
        let buffer = backend
            .create_buffer(&vertex_descriptor(4), &[1u8, 2, 3, 4])
            .unwrap();
        assert_eq!(backend.read_buffer(buffer, 8, 2), Vec::<u8>::new());
        assert_eq!(backend.read_buffer(buffer, 3, 4), vec![4]);
    }

    #[test]
    fn test_buffer_size_mismatch_rejected() {
        let backend = DummyBackend::new();
        let result = backend.create_buffer(&vertex_descriptor(8), &[0u8; 4]);
        assert!(result.is_err());
        assert_eq!(backend.live_buffer_count(), 0);
    }

    #[test]
    fn test_write_buffer_in_place() {
        let backend = DummyBackend::new();
        let descriptor = BufferDescriptor::new(4, BufferUsage::UNIFORM | BufferUsage::COPY_DST);
        let buffer = backend.create_buffer(&descriptor, &[0u8; 4]).unwrap();
        backend.write_buffer(buffer, 1, &[7, 8]).unwrap();
        assert_eq!(backend.buffer_contents(buffer).unwrap(), vec![0, 7, 8, 0]);
        assert!(backend.write_buffer(buffer, 3, &[1, 2]).is_err());
    }

    #[test]
    fn test_destroy_unknown_buffer_is_ignored() {
        let backend = DummyBackend::new();
        backend.destroy_buffer(BufferId(42));
        assert_eq!(backend.live_buffer_count(), 0);
    }

    #[test]
    fn test_draw_calls_are_recorded_in_order() {
        let backend = DummyBackend::new();
        let program = backend.create_program("", "").unwrap();
        let vb = backend.create_buffer(&vertex_descriptor(4), &[0u8; 4]).unwrap();
        let ib = backend
            .create_buffer(&BufferDescriptor::new(4, BufferUsage::INDEX), &[0u8; 4])
            .unwrap();
        let layout = VertexLayout::new(4).with_attribute(crate::mesh::VertexAttribute::new(
            crate::mesh::VertexAttributeFormat::Float,
            0,
        ));
        let vao = backend.create_vertex_array(&layout, vb, ib).unwrap();

        backend.draw_indexed(program, vao, PrimitiveTopology::TriangleList, 6);
        backend.draw_indexed_instanced(program, vao, PrimitiveTopology::TriangleList, 6, 10);

        let calls = backend.draw_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].instance_count, 1);
        assert_eq!(calls[1].instance_count, 10);
        assert_eq!(backend.query_vertex_layout(vao).unwrap(), layout);

        backend.clear_draw_calls();
        assert!(backend.draw_calls().is_empty());
    }

    #[test]
    fn test_uniforms_are_recorded() {
        let backend = DummyBackend::new();
        let program = backend.create_program("", "").unwrap();
        backend.set_uniform(program, "u_time", UniformValue::Float(0.5));
        assert_eq!(
            backend.uniform_value(program, "u_time"),
            Some(UniformValue::Float(0.5))
        );
        assert_eq!(backend.uniform_value(program, "u_other"), None);
    }
}
