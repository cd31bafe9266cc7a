//! RGBA raster manipulation for the `facepiv` PIV/TWIC facial image pipeline.
//!
//! This crate owns the pixel-level half of the pipeline: decoding common image formats into an
//! 8-bit RGBA raster, and the rotate/crop/resize/pad operations the transform executor composes to
//! place a face inside the PIV-mandated 420x560 canvas. It does not know anything about faces,
//! landmarks, or PIV geometry — that lives in the `facepiv` crate, one layer up.

mod color;
mod ops;
mod rect;
mod resolution;

pub use color::Color;
pub use ops::{pad_to_aspect, resize_bilinear, rotate_bilinear};
pub use rect::Rect;
pub use resolution::{AspectRatio, Resolution};

use std::{fmt, path::Path};

use image::{GenericImage, GenericImageView, ImageBuffer, Rgba, RgbaImage};

/// An 8-bit sRGB image with an alpha channel, backed by [`image::RgbaImage`].
#[derive(Clone)]
pub struct Image {
    pub(crate) buf: RgbaImage,
}

impl Image {
    /// Loads an image from the filesystem, dispatching on its file extension.
    ///
    /// Delegates to the `image` crate for the actual format-specific decoding; callers needing more
    /// control over the decode (eg. embedded thumbnails, unusual EXIF orientation) should read the
    /// bytes themselves and call [`Image::decode`].
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::decode(&data)
    }

    /// Decodes an image from an in-memory byte buffer, auto-detecting the format.
    pub fn decode(data: &[u8]) -> anyhow::Result<Self> {
        let buf = image::load_from_memory(data)?.to_rgba8();
        Ok(Self { buf })
    }

    /// Saves an image to the filesystem, dispatching on its file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        self.buf.save(path.as_ref())?;
        Ok(())
    }

    /// Creates an empty image of the given size, starting out black and fully transparent.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buf: ImageBuffer::new(width, height),
        }
    }

    /// Creates an image of the given size, filled with `color`.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let mut img = Self::new(width, height);
        img.clear(color);
        img
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    /// A [`Rect`] of `(0, 0, width, height)` covering this image.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_top_left(0, 0, self.width(), self.height())
    }

    pub fn clear(&mut self, color: Color) {
        self.buf.pixels_mut().for_each(|pix| pix.0 = color.0);
    }

    /// Gets the color at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the bounds of this image.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        Color(self.buf.get_pixel(x, y).0)
    }

    /// Sets the color at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the bounds of this image.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.buf.put_pixel(x, y, Rgba(color.0));
    }

    /// Forces every pixel's alpha channel to `255`.
    ///
    /// The PIV output canvas is defined to be fully opaque; this is applied as the last step of the
    /// transform executor to make that invariant hold regardless of how the raster was produced.
    pub fn force_opaque(&mut self) {
        for pixel in self.buf.pixels_mut() {
            pixel.0[3] = 255;
        }
    }

    /// Copies a rectangular region into a new [`Image`], clamped to `self`'s bounds.
    pub fn crop(&self, rect: Rect) -> Image {
        let rect = match self.rect().intersection(&rect) {
            Some(rect) => rect,
            None => {
                log::warn!(
                    "crop region {rect:?} does not overlap {}x{} image, returning an empty raster",
                    self.width(),
                    self.height()
                );
                return Image::new(0, 0);
            }
        };
        let cropped = image::imageops::crop_imm(
            &self.buf,
            rect.x() as u32,
            rect.y() as u32,
            rect.width(),
            rect.height(),
        )
        .to_image();
        Image { buf: cropped }
    }

    /// Pastes `src` into `self` at `(x, y)`, overwriting the destination pixels (no blending).
    pub fn paste(&mut self, src: &Image, x: i32, y: i32) {
        let _ = self.buf.copy_from(&src.buf, x.max(0) as u32, y.max(0) as u32);
    }

    /// The raw RGBA8 pixel bytes, row-major, 4 bytes per pixel.
    pub fn data(&self) -> &[u8] {
        self.buf.as_raw()
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} Image", self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_image_is_transparent_black() {
        let img = Image::new(4, 4);
        assert_eq!(img.get(0, 0), Color::from_rgba8(0, 0, 0, 0));
    }

    #[test]
    fn force_opaque_sets_alpha() {
        let mut img = Image::new(2, 2);
        img.force_opaque();
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(img.get(x, y).a(), 255);
            }
        }
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let img = Image::filled(10, 10, Color::WHITE);
        let cropped = img.crop(Rect::from_top_left(5, 5, 20, 20));
        assert_eq!(cropped.width(), 5);
        assert_eq!(cropped.height(), 5);
    }
}
