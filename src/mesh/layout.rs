//! Vertex layout definitions.
//!
//! A [`VertexLayout`] describes how the bytes of one interleaved vertex
//! buffer map to shader input slots: a fixed stride plus an ordered list
//! of [`VertexAttribute`]s. The attribute's position in the list is its
//! shader input slot.
//!
//! Layouts are shared via `Arc` since there are typically only a few
//! combinations across many vertex arrays.
//!
//! # Example
//!
//! ```ignore
//! // position: vec2, grid_position: vec2, interleaved, 16 bytes per vertex
//! let layout = Arc::new(VertexLayout::new(16)
//!     .with_attribute(VertexAttribute::new(VertexAttributeFormat::Float2, 0))
//!     .with_attribute(VertexAttribute::new(VertexAttributeFormat::Float2, 8)));
//! ```

use crate::error::GraphicsError;

/// Format of a vertex attribute: component type and count (1-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    /// Single 32-bit float.
    Float,
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
    /// Four 32-bit floats.
    Float4,
    /// Single 32-bit signed integer.
    Int,
    /// Two 32-bit signed integers.
    Int2,
    /// Three 32-bit signed integers.
    Int3,
    /// Four 32-bit signed integers.
    Int4,
    /// Single 32-bit unsigned integer.
    Uint,
    /// Two 32-bit unsigned integers.
    Uint2,
    /// Three 32-bit unsigned integers.
    Uint3,
    /// Four 32-bit unsigned integers.
    Uint4,
}

impl VertexAttributeFormat {
    /// Get the size in bytes of this format.
    pub fn size(&self) -> u32 {
        self.component_count() * 4
    }

    /// Get the number of components (1-4).
    pub fn component_count(&self) -> u32 {
        match self {
            Self::Float | Self::Int | Self::Uint => 1,
            Self::Float2 | Self::Int2 | Self::Uint2 => 2,
            Self::Float3 | Self::Int3 | Self::Uint3 => 3,
            Self::Float4 | Self::Int4 | Self::Uint4 => 4,
        }
    }

    /// Whether the component type is an integer type.
    pub fn is_integer(&self) -> bool {
        !matches!(self, Self::Float | Self::Float2 | Self::Float3 | Self::Float4)
    }
}

/// A single vertex attribute description.
///
/// Immutable once attached to a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Data format of this attribute.
    pub format: VertexAttributeFormat,
    /// Byte offset from the start of the vertex record.
    pub offset: u32,
    /// Whether integer data is normalized to [0, 1] / [-1, 1].
    pub normalize: bool,
}

impl VertexAttribute {
    /// Create a new, non-normalized vertex attribute.
    pub fn new(format: VertexAttributeFormat, offset: u32) -> Self {
        Self {
            format,
            offset,
            normalize: false,
        }
    }

    /// Mark integer data as normalized.
    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }
}

/// Describes the layout of one interleaved vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Stride in bytes between consecutive vertex records.
    pub stride: u32,
    /// The vertex attributes, in shader input slot order.
    pub attributes: Vec<VertexAttribute>,
    /// Optional label for debugging.
    pub label: Option<String>,
}

impl VertexLayout {
    /// Create a new empty vertex layout with the given stride.
    pub fn new(stride: u32) -> Self {
        Self {
            stride,
            attributes: Vec::new(),
            label: None,
        }
    }

    /// Add a vertex attribute.
    pub fn with_attribute(mut self, attribute: VertexAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the number of attributes.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Validate the layout.
    ///
    /// Every attribute must lie fully within the vertex record, and the
    /// normalize flag is only meaningful for integer formats.
    pub fn validate(&self) -> Result<(), GraphicsError> {
        if self.stride == 0 {
            return Err(GraphicsError::InvalidParameter(
                "vertex stride cannot be zero".to_string(),
            ));
        }
        if self.attributes.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "vertex layout has no attributes".to_string(),
            ));
        }
        for (slot, attr) in self.attributes.iter().enumerate() {
            if attr.offset + attr.format.size() > self.stride {
                return Err(GraphicsError::InvalidParameter(format!(
                    "attribute {slot} at offset {} with size {} exceeds vertex stride {}",
                    attr.offset,
                    attr.format.size(),
                    self.stride
                )));
            }
            if attr.normalize && !attr.format.is_integer() {
                return Err(GraphicsError::InvalidParameter(format!(
                    "attribute {slot} is normalized but has a float format"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(VertexAttributeFormat::Float, 4, 1)]
    #[case(VertexAttributeFormat::Float2, 8, 2)]
    #[case(VertexAttributeFormat::Float3, 12, 3)]
    #[case(VertexAttributeFormat::Int4, 16, 4)]
    #[case(VertexAttributeFormat::Uint2, 8, 2)]
    fn test_format_sizes(
        #[case] format: VertexAttributeFormat,
        #[case] size: u32,
        #[case] components: u32,
    ) {
        assert_eq!(format.size(), size);
        assert_eq!(format.component_count(), components);
    }

    #[test]
    fn test_layout_valid() {
        let layout = VertexLayout::new(16)
            .with_attribute(VertexAttribute::new(VertexAttributeFormat::Float2, 0))
            .with_attribute(VertexAttribute::new(VertexAttributeFormat::Float2, 8))
            .with_label("quad");
        assert_eq!(layout.attribute_count(), 2);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_layout_offset_out_of_stride() {
        let layout = VertexLayout::new(12)
            .with_attribute(VertexAttribute::new(VertexAttributeFormat::Float3, 4));
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_layout_zero_stride() {
        let layout =
            VertexLayout::new(0).with_attribute(VertexAttribute::new(VertexAttributeFormat::Float, 0));
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_layout_no_attributes() {
        assert!(VertexLayout::new(12).validate().is_err());
    }

    #[test]
    fn test_normalize_requires_integer_format() {
        let layout = VertexLayout::new(16).with_attribute(
            VertexAttribute::new(VertexAttributeFormat::Float4, 0).normalized(),
        );
        assert!(layout.validate().is_err());

        let layout = VertexLayout::new(16).with_attribute(
            VertexAttribute::new(VertexAttributeFormat::Uint4, 0).normalized(),
        );
        assert!(layout.validate().is_ok());
    }
}
