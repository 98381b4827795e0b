//! Common value types shared across the crate.

mod buffer;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use texture::{Filtering, TextureDescriptor, TextureKind, Wrapping};

/// Primitive topology describing how indices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Get the number of vertices per primitive (for non-strip topologies).
    pub fn vertices_per_primitive(&self) -> Option<u32> {
        match self {
            Self::PointList => Some(1),
            Self::LineList => Some(2),
            Self::TriangleList => Some(3),
            Self::LineStrip | Self::TriangleStrip => None,
        }
    }

    /// Number of primitives produced by drawing `index_count` indices.
    pub fn primitive_count(&self, index_count: u32) -> u32 {
        match self {
            Self::PointList => index_count,
            Self::LineList => index_count / 2,
            Self::LineStrip => index_count.saturating_sub(1),
            Self::TriangleList => index_count / 3,
            Self::TriangleStrip => index_count.saturating_sub(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_count() {
        assert_eq!(PrimitiveTopology::TriangleList.primitive_count(6), 2);
        assert_eq!(PrimitiveTopology::TriangleStrip.primitive_count(6), 4);
        assert_eq!(PrimitiveTopology::LineList.primitive_count(6), 3);
        assert_eq!(PrimitiveTopology::PointList.primitive_count(6), 6);
        assert_eq!(PrimitiveTopology::LineStrip.primitive_count(0), 0);
    }
}
