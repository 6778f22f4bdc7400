//! Uniform scale + offset describing where the replacement sits over the mask.

use crate::error::{Error, Result};
use crate::processing::layout::{self, Placement};
use crate::raster::RasterImage;

/// Scale and displacement of the replacement image.
///
/// Offsets are measured from the position that centres the scaled replacement
/// over the mask frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl Transform {
    #[must_use]
    pub const fn new(scale: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    /// Centred transform whose scale fits `replacement` inside `mask`.
    #[must_use]
    pub fn fitted(mask: &RasterImage, replacement: &RasterImage) -> Self {
        Self {
            scale: fit_scale(mask, replacement),
            ..Self::default()
        }
    }

    /// Same offsets, new scale.
    #[must_use]
    pub const fn with_scale(self, scale: f32) -> Self {
        Self { scale, ..self }
    }

    /// Offsets moved by a relative delta.
    #[must_use]
    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self {
            offset_x: self.offset_x + dx,
            offset_y: self.offset_y + dy,
            ..self
        }
    }

    /// # Errors
    /// [`Error::InvalidScale`] for a non-positive or non-finite scale,
    /// [`Error::InvalidOffset`] for non-finite offsets.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::InvalidScale(self.scale));
        }
        if !(self.offset_x.is_finite() && self.offset_y.is_finite()) {
            return Err(Error::InvalidOffset {
                x: self.offset_x,
                y: self.offset_y,
            });
        }
        Ok(())
    }

    /// Placement of a `source`-sized image inside a `frame`-sized canvas.
    #[must_use]
    pub fn placement(&self, frame: (u32, u32), source: (u32, u32)) -> Placement {
        Placement::new(frame, source, self.scale, self.offset_x, self.offset_y)
    }
}

/// Scale that makes `replacement` fit entirely inside `mask` ("fit inside",
/// never "cover").
#[must_use]
pub fn fit_scale(mask: &RasterImage, replacement: &RasterImage) -> f32 {
    layout::fit_scale(
        mask.width(),
        mask.height(),
        replacement.width(),
        replacement.height(),
    )
}
