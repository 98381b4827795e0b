//! OpenGL backend built on glow.
//!
//! The backend owns a [`glow::Context`] and maps the crate's opaque
//! handles onto GL object names. GL has no thread-safe command
//! submission, so despite the `Send + Sync` bounds all calls must be
//! made from the thread owning the current GL context.

use std::collections::HashMap;
use std::sync::RwLock;

use glow::HasContext;
use static_assertions::assert_impl_all;

use crate::error::GraphicsError;
use crate::mesh::{VertexAttributeFormat, VertexLayout};
use crate::shader::ShaderStage;
use crate::types::{
    BufferDescriptor, BufferUsage, Filtering, PrimitiveTopology, TextureDescriptor, TextureKind,
    Wrapping,
};

use super::{BufferId, GpuBackend, ProgramId, TextureId, UniformValue, VertexArrayId};

struct GlBuffer {
    raw: glow::NativeBuffer,
    target: u32,
}

struct GlTexture {
    raw: glow::NativeTexture,
    target: u32,
}

#[derive(Default)]
struct GlState {
    next_id: u64,
    buffers: HashMap<u64, GlBuffer>,
    vertex_arrays: HashMap<u64, glow::NativeVertexArray>,
    programs: HashMap<u64, glow::NativeProgram>,
    textures: HashMap<u64, GlTexture>,
}

impl GlState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Backend issuing real OpenGL calls through glow.
pub struct GlBackend {
    context: glow::Context,
    state: RwLock<GlState>,
}

impl GlBackend {
    /// Wrap an already-current GL context.
    pub fn new(context: glow::Context) -> Self {
        Self {
            context,
            state: RwLock::new(GlState::default()),
        }
    }

    fn buffer_target(usage: BufferUsage) -> u32 {
        if usage.contains(BufferUsage::INDEX) {
            glow::ELEMENT_ARRAY_BUFFER
        } else if usage.contains(BufferUsage::UNIFORM) {
            glow::UNIFORM_BUFFER
        } else {
            glow::ARRAY_BUFFER
        }
    }

    fn topology_mode(topology: PrimitiveTopology) -> u32 {
        match topology {
            PrimitiveTopology::PointList => glow::POINTS,
            PrimitiveTopology::LineList => glow::LINES,
            PrimitiveTopology::LineStrip => glow::LINE_STRIP,
            PrimitiveTopology::TriangleList => glow::TRIANGLES,
            PrimitiveTopology::TriangleStrip => glow::TRIANGLE_STRIP,
        }
    }

    fn compile_shader(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<glow::NativeShader, GraphicsError> {
        let shader_type = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self
                .context
                .create_shader(shader_type)
                .map_err(GraphicsError::ResourceAllocationFailed)?;
            self.context.shader_source(shader, source);
            self.context.compile_shader(shader);
            if !self.context.get_shader_compile_status(shader) {
                let log = self.context.get_shader_info_log(shader);
                self.context.delete_shader(shader);
                return Err(GraphicsError::ShaderCompileFailed { stage, log });
            }
            Ok(shader)
        }
    }

    fn bind_draw_state(&self, program: ProgramId, vertex_array: VertexArrayId) -> bool {
        let state = self.state.read().unwrap();
        let (Some(raw_program), Some(raw_vao)) = (
            state.programs.get(&program.0),
            state.vertex_arrays.get(&vertex_array.0),
        ) else {
            log::warn!(
                "Draw with unknown program {:?} or vertex array {:?}",
                program,
                vertex_array
            );
            return false;
        };
        unsafe {
            self.context.use_program(Some(*raw_program));
            self.context.bind_vertex_array(Some(*raw_vao));
        }
        true
    }
}

impl GpuBackend for GlBackend {
    fn name(&self) -> &'static str {
        "OpenGL"
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
        let target = Self::buffer_target(descriptor.usage);
        let gl_usage = if descriptor.usage.contains(BufferUsage::COPY_DST) {
            glow::DYNAMIC_DRAW
        } else {
            glow::STATIC_DRAW
        };
        let raw = unsafe {
            let raw = self
                .context
                .create_buffer()
                .map_err(GraphicsError::ResourceAllocationFailed)?;
            self.context.bind_buffer(target, Some(raw));
            self.context.buffer_data_u8_slice(target, data, gl_usage);
            raw
        };
        let mut state = self.state.write().unwrap();
        let id = state.allocate_id();
        state.buffers.insert(id, GlBuffer { raw, target });
        Ok(BufferId(id))
    }

    fn write_buffer(
        &self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let state = self.state.read().unwrap();
        let entry = state.buffers.get(&buffer.0).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("write to unknown buffer {:?}", buffer))
        })?;
        unsafe {
            self.context.bind_buffer(entry.target, Some(entry.raw));
            self.context
                .buffer_sub_data_u8_slice(entry.target, offset as i32, data);
        }
        Ok(())
    }

    fn read_buffer(&self, buffer: BufferId, offset: u64, size: u64) -> Vec<u8> {
        let state = self.state.read().unwrap();
        let Some(entry) = state.buffers.get(&buffer.0) else {
            return Vec::new();
        };
        let mut data = vec![0u8; size as usize];
        unsafe {
            self.context.bind_buffer(entry.target, Some(entry.raw));
            self.context
                .get_buffer_sub_data(entry.target, offset as i32, &mut data);
        }
        data
    }

    fn destroy_buffer(&self, buffer: BufferId) {
        let mut state = self.state.write().unwrap();
        match state.buffers.remove(&buffer.0) {
            Some(entry) => unsafe { self.context.delete_buffer(entry.raw) },
            None => log::warn!("Destroying unknown buffer {:?}", buffer),
        }
    }

    fn create_vertex_array(
        &self,
        layout: &VertexLayout,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
    ) -> Result<VertexArrayId, GraphicsError> {
        let raw = {
            let state = self.state.read().unwrap();
            let vertex = state.buffers.get(&vertex_buffer.0).ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "vertex array references unknown vertex buffer {:?}",
                    vertex_buffer
                ))
            })?;
            let index = state.buffers.get(&index_buffer.0).ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "vertex array references unknown index buffer {:?}",
                    index_buffer
                ))
            })?;
            unsafe {
                let raw = self
                    .context
                    .create_vertex_array()
                    .map_err(GraphicsError::ResourceAllocationFailed)?;
                self.context.bind_vertex_array(Some(raw));
                self.context.bind_buffer(glow::ARRAY_BUFFER, Some(vertex.raw));
                for (slot, attribute) in layout.attributes.iter().enumerate() {
                    let slot = slot as u32;
                    let components = attribute.format.component_count() as i32;
                    self.context.enable_vertex_attrib_array(slot);
                    match attribute.format {
                        VertexAttributeFormat::Float
                        | VertexAttributeFormat::Float2
                        | VertexAttributeFormat::Float3
                        | VertexAttributeFormat::Float4 => {
                            self.context.vertex_attrib_pointer_f32(
                                slot,
                                components,
                                glow::FLOAT,
                                false,
                                layout.stride as i32,
                                attribute.offset as i32,
                            );
                        }
                        format if attribute.normalize => {
                            let data_type = match format {
                                VertexAttributeFormat::Uint
                                | VertexAttributeFormat::Uint2
                                | VertexAttributeFormat::Uint3
                                | VertexAttributeFormat::Uint4 => glow::UNSIGNED_INT,
                                _ => glow::INT,
                            };
                            self.context.vertex_attrib_pointer_f32(
                                slot,
                                components,
                                data_type,
                                true,
                                layout.stride as i32,
                                attribute.offset as i32,
                            );
                        }
                        VertexAttributeFormat::Int
                        | VertexAttributeFormat::Int2
                        | VertexAttributeFormat::Int3
                        | VertexAttributeFormat::Int4 => {
                            self.context.vertex_attrib_pointer_i32(
                                slot,
                                components,
                                glow::INT,
                                layout.stride as i32,
                                attribute.offset as i32,
                            );
                        }
                        _ => {
                            self.context.vertex_attrib_pointer_i32(
                                slot,
                                components,
                                glow::UNSIGNED_INT,
                                layout.stride as i32,
                                attribute.offset as i32,
                            );
                        }
                    }
                }
                self.context
                    .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index.raw));
                self.context.bind_vertex_array(None);
                raw
            }
        };
        let mut state = self.state.write().unwrap();
        let id = state.allocate_id();
        state.vertex_arrays.insert(id, raw);
        Ok(VertexArrayId(id))
    }

    // GL offers no portable attribute introspection worth the round
    // trip; callers keep the layout CPU-side.
    fn query_vertex_layout(&self, _vertex_array: VertexArrayId) -> Option<VertexLayout> {
        None
    }

    fn destroy_vertex_array(&self, vertex_array: VertexArrayId) {
        let mut state = self.state.write().unwrap();
        match state.vertex_arrays.remove(&vertex_array.0) {
            Some(raw) => unsafe { self.context.delete_vertex_array(raw) },
            None => log::warn!("Destroying unknown vertex array {:?}", vertex_array),
        }
    }

    fn create_program(
        &self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, GraphicsError> {
        let vertex = self.compile_shader(ShaderStage::Vertex, vertex_source)?;
        let fragment = match self.compile_shader(ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(err) => {
                unsafe { self.context.delete_shader(vertex) };
                return Err(err);
            }
        };
        let raw = unsafe {
            let program = self
                .context
                .create_program()
                .map_err(GraphicsError::ResourceAllocationFailed)?;
            self.context.attach_shader(program, vertex);
            self.context.attach_shader(program, fragment);
            self.context.link_program(program);
            self.context.detach_shader(program, vertex);
            self.context.detach_shader(program, fragment);
            self.context.delete_shader(vertex);
            self.context.delete_shader(fragment);
            if !self.context.get_program_link_status(program) {
                let log = self.context.get_program_info_log(program);
                self.context.delete_program(program);
                return Err(GraphicsError::ShaderLinkFailed { log });
            }
            program
        };
        let mut state = self.state.write().unwrap();
        let id = state.allocate_id();
        state.programs.insert(id, raw);
        Ok(ProgramId(id))
    }

    fn set_uniform(&self, program: ProgramId, name: &str, value: UniformValue) {
        let state = self.state.read().unwrap();
        let Some(raw) = state.programs.get(&program.0) else {
            log::warn!("Setting uniform '{}' on unknown program {:?}", name, program);
            return;
        };
        unsafe {
            let Some(location) = self.context.get_uniform_location(*raw, name) else {
                log::debug!(
                    "Uniform '{}' has no location in program {:?} (optimized out)",
                    name,
                    program
                );
                return;
            };
            self.context.use_program(Some(*raw));
            match value {
                UniformValue::Bool(v) => self.context.uniform_1_i32(Some(&location), v as i32),
                UniformValue::Int(v) => self.context.uniform_1_i32(Some(&location), v),
                UniformValue::IVec2(v) => {
                    self.context.uniform_2_i32(Some(&location), v[0], v[1])
                }
                UniformValue::Float(v) => self.context.uniform_1_f32(Some(&location), v),
                UniformValue::Vec3(v) => {
                    self.context.uniform_3_f32(Some(&location), v[0], v[1], v[2])
                }
                UniformValue::Vec4(v) => self
                    .context
                    .uniform_4_f32(Some(&location), v[0], v[1], v[2], v[3]),
                UniformValue::Mat4(v) => {
                    self.context
                        .uniform_matrix_4_f32_slice(Some(&location), false, &v)
                }
            }
        }
    }

    fn bind_uniform_block(&self, program: ProgramId, name: &str, binding: u32, buffer: BufferId) {
        let state = self.state.read().unwrap();
        let (Some(raw_program), Some(raw_buffer)) = (
            state.programs.get(&program.0),
            state.buffers.get(&buffer.0),
        ) else {
            log::warn!(
                "Binding uniform block '{}' with unknown program {:?} or buffer {:?}",
                name,
                program,
                buffer
            );
            return;
        };
        unsafe {
            let Some(index) = self.context.get_uniform_block_index(*raw_program, name) else {
                log::debug!("Program {:?} has no uniform block '{}'", program, name);
                return;
            };
            self.context
                .uniform_block_binding(*raw_program, index, binding);
            self.context
                .bind_buffer_base(glow::UNIFORM_BUFFER, binding, Some(raw_buffer.raw));
        }
    }

    fn destroy_program(&self, program: ProgramId) {
        let mut state = self.state.write().unwrap();
        match state.programs.remove(&program.0) {
            Some(raw) => unsafe { self.context.delete_program(raw) },
            None => log::warn!("Destroying unknown program {:?}", program),
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
        let target = match descriptor.kind {
            TextureKind::D2 => glow::TEXTURE_2D,
            TextureKind::Cube => glow::TEXTURE_CUBE_MAP,
        };
        let filter = match descriptor.filtering {
            Filtering::Nearest => glow::NEAREST,
            Filtering::Linear => glow::LINEAR,
        };
        let wrap = match descriptor.wrapping {
            Wrapping::Repeat => glow::REPEAT,
        };
        let raw = unsafe {
            let raw = self
                .context
                .create_texture()
                .map_err(GraphicsError::ResourceAllocationFailed)?;
            self.context.bind_texture(target, Some(raw));
            match descriptor.kind {
                TextureKind::D2 => {
                    self.context.tex_image_2d(
                        target,
                        0,
                        glow::RGBA8 as i32,
                        descriptor.width as i32,
                        descriptor.height as i32,
                        0,
                        glow::RGBA,
                        glow::UNSIGNED_BYTE,
                        Some(pixels),
                    );
                }
                TextureKind::Cube => {
                    // Same image on all six faces.
                    for face in 0..6 {
                        self.context.tex_image_2d(
                            glow::TEXTURE_CUBE_MAP_POSITIVE_X + face,
                            0,
                            glow::RGBA8 as i32,
                            descriptor.width as i32,
                            descriptor.height as i32,
                            0,
                            glow::RGBA,
                            glow::UNSIGNED_BYTE,
                            Some(pixels),
                        );
                    }
                }
            }
            self.context
                .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter as i32);
            self.context
                .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter as i32);
            self.context
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrap as i32);
            self.context
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrap as i32);
            if descriptor.kind == TextureKind::Cube {
                self.context
                    .tex_parameter_i32(target, glow::TEXTURE_WRAP_R, wrap as i32);
            }
            raw
        };
        let mut state = self.state.write().unwrap();
        let id = state.allocate_id();
        state.textures.insert(id, GlTexture { raw, target });
        Ok(TextureId(id))
    }

    fn bind_texture(&self, texture: TextureId, unit: u32) {
        let state = self.state.read().unwrap();
        let Some(entry) = state.textures.get(&texture.0) else {
            log::warn!("Binding unknown texture {:?}", texture);
            return;
        };
        unsafe {
            self.context.active_texture(glow::TEXTURE0 + unit);
            self.context.bind_texture(entry.target, Some(entry.raw));
        }
    }

    fn destroy_texture(&self, texture: TextureId) {
        let mut state = self.state.write().unwrap();
        match state.textures.remove(&texture.0) {
            Some(entry) => unsafe { self.context.delete_texture(entry.raw) },
            None => log::warn!("Destroying unknown texture {:?}", texture),
        }
    }

    fn draw_indexed(
        &self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        index_count: u32,
    ) {
        if !self.bind_draw_state(program, vertex_array) {
            return;
        }
        unsafe {
            self.context.draw_elements(
                Self::topology_mode(topology),
                index_count as i32,
                glow::UNSIGNED_INT,
                0,
            );
        }
    }

    fn draw_indexed_instanced(
        &self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        topology: PrimitiveTopology,
        index_count: u32,
        instance_count: u32,
    ) {
        if !self.bind_draw_state(program, vertex_array) {
            return;
        }
        unsafe {
            self.context.draw_elements_instanced(
                Self::topology_mode(topology),
                index_count as i32,
                glow::UNSIGNED_INT,
                0,
                instance_count as i32,
            );
        }
    }
}

assert_impl_all!(GlBackend: Send, Sync);
