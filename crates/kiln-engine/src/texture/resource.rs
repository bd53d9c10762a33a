use std::cell::Cell;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::paint::Color;

use super::TextureError;

/// Opaque device-side texture id.
///
/// `TextureHandle::NONE` (0) means "not uploaded". Non-zero handles are only
/// meaningful to the backend instance that issued them.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureHandle(pub(crate) u32);

impl TextureHandle {
    pub const NONE: TextureHandle = TextureHandle(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self.0 != 0
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Decoded RGBA8 image plus its lazily assigned device handle.
///
/// Name, size and pixels are immutable after construction. The device handle
/// is the only mutable field and is written exclusively by backends during
/// upload/release, which is why it lives in a `Cell`: textures are shared as
/// `Rc<Texture>` between the application and the renderer.
///
/// Dropping a texture frees the CPU pixels only. Device memory belongs to the
/// backend and is freed by `RenderBackend::release_texture` or with the backend.
#[derive(Debug)]
pub struct Texture {
    name: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    handle: Cell<TextureHandle>,
}

impl Texture {
    /// Creates a texture from tightly packed RGBA8 rows (top row first).
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::EmptyDimensions { width, height });
        }

        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(TextureError::PixelLength {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            name: name.into(),
            width,
            height,
            pixels,
            handle: Cell::new(TextureHandle::NONE),
        })
    }

    /// Wraps an already decoded `image` buffer.
    pub fn from_rgba_image(
        name: impl Into<String>,
        image: image::RgbaImage,
    ) -> Result<Self, TextureError> {
        let (width, height) = image.dimensions();
        Self::new(name, width, height, image.into_raw())
    }

    /// Decodes a PNG file into RGBA8.
    ///
    /// Palette, grayscale and 16-bit sources are expanded to 8-bit RGBA.
    pub fn load_png(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self, TextureError> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|source| TextureError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let decoded = image::load(BufReader::new(file), image::ImageFormat::Png).map_err(
            |source| TextureError::Decode {
                path: path.to_path_buf(),
                source,
            },
        )?;

        let texture = Self::from_rgba_image(name, decoded.into_rgba8())?;
        log::debug!(
            "loaded texture '{}' ({}x{}) from {}",
            texture.name,
            texture.width,
            texture.height,
            path.display()
        );
        Ok(texture)
    }

    /// Procedural two-color checkerboard, `size`×`size` pixels with `cell`-pixel squares.
    pub fn checkerboard(
        name: impl Into<String>,
        size: u32,
        cell: u32,
        a: Color,
        b: Color,
    ) -> Result<Self, TextureError> {
        let cell = cell.max(1);
        let to_bytes = |c: Color| {
            let c = c.clamped();
            [
                (c.r * 255.0).round() as u8,
                (c.g * 255.0).round() as u8,
                (c.b * 255.0).round() as u8,
                (c.a * 255.0).round() as u8,
            ]
        };
        let (pa, pb) = (to_bytes(a), to_bytes(b));

        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.extend_from_slice(if even { &pa } else { &pb });
            }
        }

        Self::new(name, size, size, pixels)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixels, rows top to bottom.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn device_handle(&self) -> TextureHandle {
        self.handle.get()
    }

    #[inline]
    pub fn is_uploaded(&self) -> bool {
        self.handle.get().is_some()
    }

    pub(crate) fn set_device_handle(&self, handle: TextureHandle) {
        self.handle.set(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_starts_without_device_handle() {
        let t = Texture::new("white", 2, 2, vec![255; 16]).unwrap();
        assert_eq!(t.name(), "white");
        assert_eq!((t.width(), t.height()), (2, 2));
        assert_eq!(t.device_handle(), TextureHandle::NONE);
        assert!(!t.is_uploaded());
    }

    #[test]
    fn new_rejects_wrong_pixel_length() {
        let err = Texture::new("bad", 2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            TextureError::PixelLength { expected: 16, actual: 15 }
        ));
    }

    #[test]
    fn new_rejects_zero_size() {
        let err = Texture::new("empty", 0, 4, Vec::new()).unwrap_err();
        assert!(matches!(err, TextureError::EmptyDimensions { width: 0, height: 4 }));
    }

    #[test]
    fn handle_is_shared_through_cell() {
        let t = Texture::new("t", 1, 1, vec![0; 4]).unwrap();
        t.set_device_handle(TextureHandle(7));
        assert!(t.is_uploaded());
        assert_eq!(t.device_handle().raw(), 7);
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let t = Texture::checkerboard("c", 4, 2, Color::WHITE, Color::BLACK).unwrap();
        let px = |x: usize, y: usize| &t.pixels()[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
        assert_eq!(px(0, 0), &[255, 255, 255, 255]);
        assert_eq!(px(2, 0), &[0, 0, 0, 255]);
        assert_eq!(px(2, 2), &[255, 255, 255, 255]);
    }

    #[test]
    fn from_rgba_image_keeps_dimensions() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]));
        let t = Texture::from_rgba_image("img", img).unwrap();
        assert_eq!((t.width(), t.height()), (3, 2));
        assert_eq!(&t.pixels()[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn load_png_reports_missing_file() {
        let err = Texture::load_png("/definitely/not/here.png", "missing").unwrap_err();
        assert!(matches!(err, TextureError::Open { .. }));
    }
}
