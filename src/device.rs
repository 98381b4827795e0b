//! Device: the entry point for creating GPU resources.
//!
//! A [`Device`] wraps a backend and tracks the resources it hands out
//! through weak references, so leak checks and cleanup stay cheap and
//! never extend resource lifetimes.

use std::path::Path;
use std::sync::{Arc, RwLock, Weak};

use bytemuck::Pod;
use static_assertions::assert_impl_all;

use crate::backend::GpuBackend;
use crate::error::GraphicsError;
use crate::mesh::{VertexArray, VertexLayout};
use crate::resources::{Buffer, Texture};
use crate::shader::ShaderProgram;
use crate::types::{
    BufferDescriptor, BufferUsage, Filtering, PrimitiveTopology, TextureDescriptor, TextureKind,
    Wrapping,
};

/// Factory and tracker for GPU resources.
pub struct Device {
    backend: Arc<dyn GpuBackend>,
    buffers: RwLock<Vec<Weak<Buffer>>>,
    shaders: RwLock<Vec<Weak<ShaderProgram>>>,
    textures: RwLock<Vec<Weak<Texture>>>,
}

impl Device {
    /// Create a device on top of a backend.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Arc<Self> {
        log::info!("Creating device with {} backend", backend.name());
        Arc::new(Self {
            backend,
            buffers: RwLock::new(Vec::new()),
            shaders: RwLock::new(Vec::new()),
            textures: RwLock::new(Vec::new()),
        })
    }

    /// Get the backend this device issues commands to.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Create a buffer initialized with typed records.
    ///
    /// `descriptor.size` must equal the byte length of `data`.
    pub fn create_buffer<T: Pod>(
        self: &Arc<Self>,
        descriptor: BufferDescriptor,
        data: &[T],
    ) -> Result<Arc<Buffer>, GraphicsError> {
        if data.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "buffer data cannot be empty".to_string(),
            ));
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if descriptor.size != bytes.len() as u64 {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer descriptor size {} does not match data length {}",
                descriptor.size,
                bytes.len()
            )));
        }
        let buffer = Arc::new(Buffer::new(
            self.backend.clone(),
            descriptor,
            std::mem::size_of::<T>(),
            data.len(),
            bytes,
        )?);
        self.buffers.write().unwrap().push(Arc::downgrade(&buffer));
        Ok(buffer)
    }

    /// Create an updatable uniform buffer holding `records`.
    ///
    /// The record type must follow the std140 rule of being padded to a
    /// 16-byte boundary, so the CPU-side slice can be uploaded verbatim.
    pub fn create_uniform_buffer<T: Pod>(
        self: &Arc<Self>,
        records: &[T],
    ) -> Result<Arc<Buffer>, GraphicsError> {
        if std::mem::size_of::<T>() % 16 != 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "uniform record size {} is not a multiple of 16 bytes",
                std::mem::size_of::<T>()
            )));
        }
        let bytes: &[u8] = bytemuck::cast_slice(records);
        let descriptor = BufferDescriptor::new(
            bytes.len() as u64,
            BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        );
        self.create_buffer(descriptor, records)
    }

    /// Compile and link a shader program from GLSL stage sources.
    pub fn create_shader(
        self: &Arc<Self>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Arc<ShaderProgram>, GraphicsError> {
        let shader = Arc::new(ShaderProgram::new(
            self.backend.clone(),
            vertex_source,
            fragment_source,
        )?);
        self.shaders.write().unwrap().push(Arc::downgrade(&shader));
        Ok(shader)
    }

    /// Create a drawable vertex array.
    ///
    /// The vertex type must match the layout stride. When `indices` is
    /// `None`, the identity index list `0..vertex_count` is generated.
    /// Every provided index must address an existing vertex.
    pub fn create_vertex_array<V: Pod>(
        self: &Arc<Self>,
        shader: Arc<ShaderProgram>,
        layout: Arc<VertexLayout>,
        topology: PrimitiveTopology,
        vertices: &[V],
        indices: Option<Vec<u32>>,
    ) -> Result<VertexArray, GraphicsError> {
        layout.validate()?;
        if vertices.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "vertex array needs at least one vertex".to_string(),
            ));
        }
        if std::mem::size_of::<V>() != layout.stride as usize {
            return Err(GraphicsError::InvalidParameter(format!(
                "vertex size {} does not match layout stride {}",
                std::mem::size_of::<V>(),
                layout.stride
            )));
        }
        let vertex_count = vertices.len() as u32;
        let indices =
            indices.unwrap_or_else(|| (0..vertex_count).collect());
        for &index in &indices {
            if index >= vertex_count {
                return Err(GraphicsError::IndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
        }
        let index_count = indices.len() as u32;

        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let vertex_buffer = self.create_buffer(
            BufferDescriptor::new(vertex_bytes.len() as u64, BufferUsage::VERTEX),
            vertices,
        )?;
        let index_buffer = self.create_buffer(
            BufferDescriptor::new((indices.len() * 4) as u64, BufferUsage::INDEX),
            &indices,
        )?;

        VertexArray::new(
            self.backend.clone(),
            shader,
            layout,
            topology,
            vertex_buffer,
            index_buffer,
            vertex_count,
            index_count,
        )
    }

    /// Create a texture from decoded RGBA8 pixels.
    pub fn create_texture(
        self: &Arc<Self>,
        descriptor: TextureDescriptor,
        pixels: &[u8],
    ) -> Result<Arc<Texture>, GraphicsError> {
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(GraphicsError::InvalidParameter(
                "texture dimensions cannot be zero".to_string(),
            ));
        }
        if descriptor.byte_size() != pixels.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture of {}x{} expects {} bytes, got {}",
                descriptor.width,
                descriptor.height,
                descriptor.byte_size(),
                pixels.len()
            )));
        }
        let texture = Arc::new(Texture::new(self.backend.clone(), descriptor, pixels)?);
        self.textures.write().unwrap().push(Arc::downgrade(&texture));
        Ok(texture)
    }

    /// Load a 2D texture from an image file.
    pub fn load_texture(
        self: &Arc<Self>,
        path: impl AsRef<Path>,
        filtering: Filtering,
        wrapping: Wrapping,
    ) -> Result<Arc<Texture>, GraphicsError> {
        self.load_image(path.as_ref(), TextureKind::D2, filtering, wrapping)
    }

    /// Load a cubemap from an image file, applied to all six faces.
    pub fn load_cubemap(
        self: &Arc<Self>,
        path: impl AsRef<Path>,
        filtering: Filtering,
        wrapping: Wrapping,
    ) -> Result<Arc<Texture>, GraphicsError> {
        self.load_image(path.as_ref(), TextureKind::Cube, filtering, wrapping)
    }

    fn load_image(
        self: &Arc<Self>,
        path: &Path,
        kind: TextureKind,
        filtering: Filtering,
        wrapping: Wrapping,
    ) -> Result<Arc<Texture>, GraphicsError> {
        let image = image::open(path)
            .map_err(|err| {
                GraphicsError::AssetLoadFailed(format!("{}: {}", path.display(), err))
            })?
            .into_rgba8();
        let (width, height) = image.dimensions();
        let mut descriptor = match kind {
            TextureKind::D2 => TextureDescriptor::new_2d(width, height),
            TextureKind::Cube => TextureDescriptor::new_cube(width, height),
        }
        .with_filtering(filtering)
        .with_wrapping(wrapping);
        descriptor.label = path.file_name().map(|name| name.to_string_lossy().into_owned());
        self.create_texture(descriptor, image.as_raw())
    }

    /// Get the number of live buffers created through this device.
    pub fn buffer_count(&self) -> usize {
        self.buffers
            .read()
            .unwrap()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Get the number of live shader programs.
    pub fn shader_count(&self) -> usize {
        self.shaders
            .read()
            .unwrap()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Get the number of live textures.
    pub fn texture_count(&self) -> usize {
        self.textures
            .read()
            .unwrap()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Drop tracking entries for resources that no longer exist.
    pub fn cleanup_dead_resources(&self) {
        self.buffers
            .write()
            .unwrap()
            .retain(|weak| weak.strong_count() > 0);
        self.shaders
            .write()
            .unwrap()
            .retain(|weak| weak.strong_count() > 0);
        self.textures
            .write()
            .unwrap()
            .retain(|weak| weak.strong_count() > 0);
    }
}

assert_impl_all!(Device: Send, Sync);
