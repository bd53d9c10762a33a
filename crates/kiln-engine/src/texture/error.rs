use std::fmt;
use std::path::PathBuf;

/// Error returned when a [`Texture`](super::Texture) cannot be constructed.
#[derive(Debug)]
pub enum TextureError {
    /// Width or height is zero.
    EmptyDimensions { width: u32, height: u32 },
    /// Pixel buffer length does not equal `width * height * 4`.
    PixelLength { expected: usize, actual: usize },
    /// The image file could not be opened.
    Open { path: PathBuf, source: std::io::Error },
    /// The image file could not be decoded.
    Decode { path: PathBuf, source: image::ImageError },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::EmptyDimensions { width, height } => {
                write!(f, "texture has empty dimensions {width}x{height}")
            }
            TextureError::PixelLength { expected, actual } => {
                write!(f, "texture pixel buffer holds {actual} bytes, expected {expected} (RGBA8)")
            }
            TextureError::Open { path, source } => {
                write!(f, "failed to open image {}: {source}", path.display())
            }
            TextureError::Decode { path, source } => {
                write!(f, "failed to decode image {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::Open { source, .. } => Some(source),
            TextureError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}
