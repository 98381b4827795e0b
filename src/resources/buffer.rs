//! GPU buffer resource.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytemuck::Pod;
use static_assertions::assert_impl_all;

use crate::backend::{BufferId, GpuBackend};
use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, BufferUsage};

/// A GPU buffer holding `element_count` records of `element_stride`
/// bytes each.
///
/// Releasing frees the backend allocation; further updates fail and a
/// second release is a no-op. Dropping releases implicitly.
pub struct Buffer {
    backend: Arc<dyn GpuBackend>,
    id: BufferId,
    descriptor: BufferDescriptor,
    element_stride: usize,
    element_count: usize,
    released: AtomicBool,
}

impl Buffer {
    pub(crate) fn new(
        backend: Arc<dyn GpuBackend>,
        descriptor: BufferDescriptor,
        element_stride: usize,
        element_count: usize,
        data: &[u8],
    ) -> Result<Self, GraphicsError> {
        let id = backend.create_buffer(&descriptor, data)?;
        log::trace!(
            "Created buffer {:?} ({} x {} bytes, {:?})",
            id,
            element_count,
            element_stride,
            descriptor.usage
        );
        Ok(Self {
            backend,
            id,
            descriptor,
            element_stride,
            element_count,
            released: AtomicBool::new(false),
        })
    }

    /// Get the backend handle of this buffer.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Get the buffer descriptor.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    /// Get the byte stride of one record.
    pub fn element_stride(&self) -> usize {
        self.element_stride
    }

    /// Get the number of records in the buffer.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Whether the buffer has been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Re-upload the full contents of the buffer.
    ///
    /// The record type and count must match the ones the buffer was
    /// created with, and the buffer must carry `COPY_DST` usage.
    pub fn update<T: Pod>(&self, records: &[T]) -> Result<(), GraphicsError> {
        if self.is_released() {
            return Err(GraphicsError::InvalidParameter(
                "update on a released buffer".to_string(),
            ));
        }
        if !self.descriptor.usage.contains(BufferUsage::COPY_DST) {
            return Err(GraphicsError::InvalidParameter(
                "buffer was not created with COPY_DST usage".to_string(),
            ));
        }
        if std::mem::size_of::<T>() != self.element_stride {
            return Err(GraphicsError::InvalidParameter(format!(
                "record size {} does not match buffer stride {}",
                std::mem::size_of::<T>(),
                self.element_stride
            )));
        }
        if records.len() != self.element_count {
            return Err(GraphicsError::InvalidParameter(format!(
                "record count {} does not match buffer capacity {}",
                records.len(),
                self.element_count
            )));
        }
        self.backend
            .write_buffer(self.id, 0, bytemuck::cast_slice(records))
    }

    /// Read the full buffer contents back from the backend.
    pub fn contents(&self) -> Vec<u8> {
        self.backend.read_buffer(self.id, 0, self.descriptor.size)
    }

    /// Free the backend allocation. Safe to call more than once.
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.backend.destroy_buffer(self.id);
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("element_stride", &self.element_stride)
            .field("element_count", &self.element_count)
            .field("released", &self.is_released())
            .finish()
    }
}

assert_impl_all!(Buffer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;

    fn make_buffer(backend: &Arc<DummyBackend>, usage: BufferUsage, data: &[f32]) -> Buffer {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let descriptor = BufferDescriptor::new(bytes.len() as u64, usage);
        Buffer::new(backend.clone() as Arc<dyn GpuBackend>, descriptor, 4, data.len(), bytes)
            .unwrap()
    }

    #[test]
    fn test_update_round_trip() {
        let backend = Arc::new(DummyBackend::new());
        let buffer = make_buffer(
            &backend,
            BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            &[0.0f32; 4],
        );
        buffer.update(&[1.0f32, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(
            buffer.contents(),
            bytemuck::cast_slice::<f32, u8>(&[1.0, 2.0, 3.0, 4.0]).to_vec()
        );
    }

    #[test]
    fn test_update_requires_copy_dst() {
        let backend = Arc::new(DummyBackend::new());
        let buffer = make_buffer(&backend, BufferUsage::VERTEX, &[0.0f32; 4]);
        assert!(buffer.update(&[1.0f32; 4]).is_err());
    }

    #[test]
    fn test_update_rejects_wrong_count() {
        let backend = Arc::new(DummyBackend::new());
        let buffer = make_buffer(
            &backend,
            BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            &[0.0f32; 4],
        );
        assert!(buffer.update(&[1.0f32; 3]).is_err());
    }

    #[test]
    fn test_release_is_idempotent() {
        let backend = Arc::new(DummyBackend::new());
        let buffer = make_buffer(&backend, BufferUsage::VERTEX, &[0.0f32; 4]);
        let id = buffer.id();
        buffer.release();
        buffer.release();
        assert!(buffer.is_released());
        assert_eq!(backend.buffer_contents(id), None);
        assert_eq!(backend.live_buffer_count(), 0);
    }

    #[test]
    fn test_update_after_release_fails() {
        let backend = Arc::new(DummyBackend::new());
        let buffer = make_buffer(
            &backend,
            BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            &[0.0f32; 4],
        );
        buffer.release();
        assert!(buffer.update(&[1.0f32; 4]).is_err());
    }
}
