//! Drawable surfaces the session paints frames onto.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use tracing::trace;

use crate::error::{Error, Result};

/// Target for rendered frames. Presentation scaling is the surface's concern.
pub trait RenderSurface {
    /// Replace the surface contents with `frame`.
    fn paint(&mut self, frame: &RgbaImage) -> Result<()>;

    /// Blank the surface.
    fn clear(&mut self) -> Result<()>;

    /// Pixel dimensions of the last painted frame, if any.
    fn dimensions(&self) -> Option<(u32, u32)>;
}

/// Keeps the last painted frame in memory.
#[derive(Debug, Default)]
pub struct MemorySurface {
    frame: Option<RgbaImage>,
    paints: u64,
}

impl MemorySurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }

    /// Number of frames painted since creation.
    #[must_use]
    pub const fn paint_count(&self) -> u64 {
        self.paints
    }
}

impl RenderSurface for MemorySurface {
    fn paint(&mut self, frame: &RgbaImage) -> Result<()> {
        self.frame = Some(frame.clone());
        self.paints += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.frame = None;
        Ok(())
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.frame.as_ref().map(RgbaImage::dimensions)
    }
}

/// Mirrors every painted frame to a PNG file.
#[derive(Debug)]
pub struct PngFileSurface {
    path: PathBuf,
    dims: Option<(u32, u32)>,
}

impl PngFileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dims: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenderSurface for PngFileSurface {
    fn paint(&mut self, frame: &RgbaImage) -> Result<()> {
        frame
            .save_with_format(&self.path, ImageFormat::Png)
            .map_err(Error::Encode)?;
        self.dims = Some(frame.dimensions());
        trace!(path = %self.path.display(), "surface written");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        self.dims = None;
        Ok(())
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.dims
    }
}
