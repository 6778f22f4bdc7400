//! Immutable handle to decoded RGBA8 pixels.

use std::sync::Arc;

use image::RgbaImage;

use crate::error::{Error, Result};

/// Decoded image shared between the session, the compositor and the surface.
///
/// Cloning is cheap; the pixel buffer is reference counted and never mutated
/// after construction.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: Arc<RgbaImage>,
}

impl RasterImage {
    /// Wrap a decoded buffer.
    ///
    /// # Errors
    /// Returns [`Error::EmptyImage`] if either dimension is zero.
    pub fn new(pixels: RgbaImage) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage { width, height });
        }
        Ok(Self {
            pixels: Arc::new(pixels),
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Borrow the underlying pixel buffer.
    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Alpha channel at `(x, y)`, or `None` outside the image.
    #[must_use]
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        self.pixels.get_pixel_checked(x, y).map(|px| px[3])
    }
}
