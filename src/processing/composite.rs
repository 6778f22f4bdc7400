//! Mask-as-alpha-stencil compositing.
//!
//! Both modes share one placement: the replacement is scaled uniformly,
//! centred over the mask frame and displaced by the transform offsets, then
//! rasterised into a frame-sized layer. The modes only differ in how the mask
//! alpha gates that layer:
//!
//! * [`CompositeMode::Final`] multiplies the layer alpha by the mask alpha and
//!   clears every pixel where the mask is fully transparent.
//! * [`CompositeMode::Preview`] paints the layer at the ghost opacity, then
//!   overwrites every pixel inside the silhouette (mask alpha above zero) with
//!   the final pixel. Inside the silhouette the preview is therefore the final
//!   composite, antialiased edges included; outside it the layer shows at
//!   alpha `a * g`, never attenuated by the mask.

use std::time::Instant;

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::config::ResizeFilter;
use crate::error::Result;
use crate::processing::resample::resample_window;
use crate::raster::RasterImage;
use crate::transform::Transform;

/// Opacity of the replacement outside the silhouette in previews.
pub const DEFAULT_GHOST_OPACITY: f32 = 0.3;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    Preview,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeOptions {
    pub ghost_opacity: f32,
    pub filter: ResizeFilter,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            ghost_opacity: DEFAULT_GHOST_OPACITY,
            filter: ResizeFilter::default(),
        }
    }
}

/// A frame sized exactly like the mask.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeResult {
    mode: CompositeMode,
    image: RgbaImage,
}

impl CompositeResult {
    #[must_use]
    pub const fn mode(&self) -> CompositeMode {
        self.mode
    }

    #[must_use]
    pub const fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Composite with the default ghost opacity and filter.
///
/// # Errors
/// Fails with [`crate::Error::InvalidScale`] for a non-positive scale.
pub fn composite(
    mask: &RasterImage,
    replacement: &RasterImage,
    transform: &Transform,
    mode: CompositeMode,
) -> Result<CompositeResult> {
    composite_with(mask, replacement, transform, mode, &CompositeOptions::default())
}

/// # Errors
/// Fails with [`crate::Error::InvalidScale`] or [`crate::Error::InvalidOffset`]
/// for an invalid transform, or [`crate::Error::Resample`] if scaling fails.
pub fn composite_with(
    mask: &RasterImage,
    replacement: &RasterImage,
    transform: &Transform,
    mode: CompositeMode,
    options: &CompositeOptions,
) -> Result<CompositeResult> {
    let started = Instant::now();
    let mut image = place_layer(mask.dimensions(), replacement, transform, options.filter)?;
    let coverage = coverage_table(mode, options.ghost_opacity);
    for (px, mask_px) in image.pixels_mut().zip(mask.pixels().pixels()) {
        *px = gate(*px, coverage[usize::from(mask_px[3])]);
    }
    debug!(
        ?mode,
        width = image.width(),
        height = image.height(),
        scale = transform.scale,
        elapsed_us = started.elapsed().as_micros() as u64,
        "composited"
    );
    Ok(CompositeResult { mode, image })
}

/// Rasterise the transformed replacement into a transparent `frame`-sized layer.
///
/// # Errors
/// Fails on an invalid transform or a resampler error.
pub fn place_layer(
    frame: (u32, u32),
    replacement: &RasterImage,
    transform: &Transform,
    filter: ResizeFilter,
) -> Result<RgbaImage> {
    transform.validate()?;
    let mut layer = RgbaImage::new(frame.0, frame.1);
    let placement = transform.placement(frame, replacement.dimensions());
    let Some(dest) = placement.clip_to_frame(frame.0, frame.1) else {
        return Ok(layer);
    };
    let window = placement.source_window(dest, replacement.width(), replacement.height());
    let visible = resample_window(replacement.pixels(), window, dest.width, dest.height, filter)?;
    image::imageops::replace(&mut layer, &visible, i64::from(dest.x), i64::from(dest.y));
    Ok(layer)
}

/// Effective coverage (0–255) for each mask alpha value.
fn coverage_table(mode: CompositeMode, ghost_opacity: f32) -> [u8; 256] {
    let mut table: [u8; 256] = std::array::from_fn(|m| m as u8);
    if mode == CompositeMode::Preview {
        table[0] = (ghost_opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    table
}

fn gate(px: Rgba<u8>, coverage: u8) -> Rgba<u8> {
    let alpha = (u32::from(px[3]) * u32::from(coverage) + 127) / 255;
    if alpha == 0 {
        return TRANSPARENT;
    }
    Rgba([px[0], px[1], px[2], alpha as u8])
}
