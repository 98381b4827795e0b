//! GPU resources with explicit release semantics.

mod buffer;
mod texture;

pub use buffer::Buffer;
pub use texture::Texture;
