//! tessera-graphics: a small GPU-object graphics abstraction.
//!
//! The crate is organized around a [`Device`] that creates resources on
//! top of a pluggable [`GpuBackend`](backend::GpuBackend):
//!
//! - [`Buffer`] and [`Texture`]: GPU resources with explicit release
//! - [`VertexLayout`](mesh::VertexLayout) and [`VertexArray`](mesh::VertexArray):
//!   interleaved vertex data and drawable geometry
//! - [`ShaderProgram`]: GLSL programs with typed, name-keyed uniforms
//! - [`Camera`]: look-at camera with perspective/orthographic projection
//!
//! The built-in [`DummyBackend`](backend::DummyBackend) records commands
//! in memory, so everything above runs without a GPU.

pub mod backend;
pub mod camera;
pub mod device;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod resources;
pub mod shader;
pub mod types;

pub use camera::{Camera, Projection};
pub use device::Device;
pub use error::GraphicsError;
pub use resources::{Buffer, Texture};
pub use shader::{ShaderProgram, ShaderStage};
pub use types::{
    BufferDescriptor, BufferUsage, Filtering, PrimitiveTopology, TextureDescriptor, TextureKind,
    Wrapping,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the crate version. Call once at startup.
pub fn init() {
    log::info!("tessera-graphics {}", VERSION);
}
