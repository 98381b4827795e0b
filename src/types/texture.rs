//! Texture types and descriptors.

/// Kind of texture: flat 2D image or cubemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureKind {
    /// A 2D texture.
    #[default]
    D2,
    /// A cubemap texture (the same image is applied to all six faces).
    Cube,
}

/// Texture minification/magnification filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filtering {
    /// Nearest-neighbor sampling.
    Nearest,
    /// Linear interpolation.
    #[default]
    Linear,
}

/// Texture coordinate wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Wrapping {
    /// Repeat the texture outside [0, 1].
    #[default]
    Repeat,
}

/// Descriptor for creating a texture from decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    /// Kind of texture.
    pub kind: TextureKind,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Filtering mode.
    pub filtering: Filtering,
    /// Wrapping mode.
    pub wrapping: Wrapping,
}

impl TextureDescriptor {
    /// Create a 2D texture descriptor.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            label: None,
            kind: TextureKind::D2,
            width,
            height,
            filtering: Filtering::default(),
            wrapping: Wrapping::default(),
        }
    }

    /// Create a cubemap texture descriptor.
    pub fn new_cube(width: u32, height: u32) -> Self {
        Self {
            kind: TextureKind::Cube,
            ..Self::new_2d(width, height)
        }
    }

    /// Set the filtering mode.
    pub fn with_filtering(mut self, filtering: Filtering) -> Self {
        self.filtering = filtering;
        self
    }

    /// Set the wrapping mode.
    pub fn with_wrapping(mut self, wrapping: Wrapping) -> Self {
        self.wrapping = wrapping;
        self
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Expected RGBA8 payload size in bytes.
    pub fn byte_size(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_descriptor() {
        let desc = TextureDescriptor::new_2d(4, 2)
            .with_filtering(Filtering::Nearest)
            .with_label("board");
        assert_eq!(desc.kind, TextureKind::D2);
        assert_eq!(desc.byte_size(), 32);
        assert_eq!(desc.filtering, Filtering::Nearest);

        let cube = TextureDescriptor::new_cube(8, 8);
        assert_eq!(cube.kind, TextureKind::Cube);
        assert_eq!(cube.wrapping, Wrapping::Repeat);
    }
}
