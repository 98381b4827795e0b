//! GPU texture resource.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use static_assertions::assert_impl_all;

use crate::backend::{GpuBackend, TextureId};
use crate::error::GraphicsError;
use crate::types::TextureDescriptor;

/// A GPU texture created from decoded RGBA8 pixels.
pub struct Texture {
    backend: Arc<dyn GpuBackend>,
    id: TextureId,
    descriptor: TextureDescriptor,
    released: AtomicBool,
}

impl Texture {
    pub(crate) fn new(
        backend: Arc<dyn GpuBackend>,
        descriptor: TextureDescriptor,
        pixels: &[u8],
    ) -> Result<Self, GraphicsError> {
        let id = backend.create_texture(&descriptor, pixels)?;
        log::trace!(
            "Created texture {:?} ({}x{}, {:?})",
            id,
            descriptor.width,
            descriptor.height,
            descriptor.kind
        );
        Ok(Self {
            backend,
            id,
            descriptor,
            released: AtomicBool::new(false),
        })
    }

    /// Get the backend handle of this texture.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Get the texture descriptor.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Get the texture dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.descriptor.width, self.descriptor.height)
    }

    /// Whether the texture has been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Bind the texture to a texture unit.
    pub fn bind(&self, unit: u32) {
        if self.is_released() {
            log::warn!("Binding released texture {:?}", self.id);
            return;
        }
        self.backend.bind_texture(self.id, unit);
    }

    /// Free the backend allocation. Safe to call more than once.
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.backend.destroy_texture(self.id);
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("released", &self.is_released())
            .finish()
    }
}

assert_impl_all!(Texture: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;
    use crate::types::Filtering;

    #[test]
    fn test_create_and_bind() {
        let backend = Arc::new(DummyBackend::new());
        let descriptor = TextureDescriptor::new_2d(2, 2).with_filtering(Filtering::Nearest);
        let texture = Texture::new(
            backend.clone() as Arc<dyn GpuBackend>,
            descriptor,
            &[255u8; 16],
        )
        .unwrap();
        texture.bind(0);
        assert_eq!(backend.bound_texture(0), Some(texture.id()));
        assert_eq!(texture.dimensions(), (2, 2));
    }

    #[test]
    fn test_pixel_size_mismatch_rejected() {
        let backend = Arc::new(DummyBackend::new());
        let descriptor = TextureDescriptor::new_2d(2, 2);
        let result = Texture::new(backend as Arc<dyn GpuBackend>, descriptor, &[0u8; 8]);
        assert!(result.is_err());
    }

    #[test]
    fn test_release_is_idempotent() {
        let backend = Arc::new(DummyBackend::new());
        let texture = Texture::new(
            backend.clone() as Arc<dyn GpuBackend>,
            TextureDescriptor::new_2d(1, 1),
            &[0u8; 4],
        )
        .unwrap();
        texture.release();
        texture.release();
        assert_eq!(backend.live_texture_count(), 0);
    }
}
