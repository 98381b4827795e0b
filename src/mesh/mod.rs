//! Vertex data description and drawable vertex arrays.

mod layout;
mod vertex_array;

pub use layout::{VertexAttribute, VertexAttributeFormat, VertexLayout};
pub use vertex_array::VertexArray;
