use fast_image_resize as fir;
use image::{RgbaImage, imageops};

use crate::config::ResizeFilter;
use crate::error::{Error, Result};
use crate::processing::layout::SourceWindow;

impl ResizeFilter {
    fn algorithm(self) -> fir::ResizeAlg {
        match self {
            Self::Nearest => fir::ResizeAlg::Nearest,
            Self::Bilinear => fir::ResizeAlg::Convolution(fir::FilterType::Bilinear),
            Self::CatmullRom => fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom),
            Self::Lanczos3 => fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3),
        }
    }

    /// Kernel radius in source pixels at unit scale.
    fn support(self) -> f64 {
        match self {
            Self::Nearest => 0.0,
            Self::Bilinear => 1.0,
            Self::CatmullRom => 2.0,
            Self::Lanczos3 => 3.0,
        }
    }

    /// Catmull-Rom evaluates to exactly zero one pixel away from the centre.
    fn has_interior_zero(self) -> bool {
        matches!(self, Self::CatmullRom)
    }
}

/// Horizontal shift, in source pixels, applied to a window whose first column
/// lands on a kernel zero.
const KERNEL_ZERO_NUDGE: f64 = 1e-6;

/// Whether the first output column samples an exact interior zero of the
/// kernel at its leading edge.
///
/// `fast_image_resize` trims leading zero weights per column. When that trim
/// reaches past the interior zero, the first column starts after the second
/// one and the horizontal pass underflows. The arithmetic mirrors the
/// resizer's coefficient setup so the check sees the same floats.
fn first_column_hits_kernel_zero(window: &SourceWindow, target_w: u32, filter: ResizeFilter) -> bool {
    if !filter.has_interior_zero() {
        return false;
    }
    let scale = (window.left + window.width - window.left) / f64::from(target_w);
    let filter_scale = scale.max(1.0);
    let in_center = window.left + 0.5 * scale;
    let center = in_center - 0.5;
    let recip = 1.0 / filter_scale;
    let x_min = (in_center - filter.support() * filter_scale).floor().max(0.0) as u32;
    (x_min..)
        .map(f64::from)
        .take_while(|x| *x <= center)
        .any(|x| (x - center) * recip == -1.0)
}

fn nudge_off_kernel_zero(mut window: SourceWindow, target_w: u32, filter: ResizeFilter) -> SourceWindow {
    for _ in 0..4 {
        if !first_column_hits_kernel_zero(&window, target_w, filter) {
            break;
        }
        if window.left >= KERNEL_ZERO_NUDGE {
            window.left -= KERNEL_ZERO_NUDGE;
        } else {
            window.left += KERNEL_ZERO_NUDGE;
            window.width -= KERNEL_ZERO_NUDGE;
        }
    }
    window
}

/// Resample `window` of `source` into a `target_w x target_h` buffer.
///
/// Only the window is read, so the cost follows the visible area rather than
/// the full scaled size of the source.
pub fn resample_window(
    source: &RgbaImage,
    window: SourceWindow,
    target_w: u32,
    target_h: u32,
    filter: ResizeFilter,
) -> Result<RgbaImage> {
    if target_w == 0 || target_h == 0 {
        return Err(Error::Resample("resize dimensions must be positive".into()));
    }
    if window.is_pixel_aligned(target_w, target_h) {
        // Whole-pixel 1:1 window: copy instead of filtering.
        return Ok(imageops::crop_imm(
            source,
            window.left as u32,
            window.top as u32,
            target_w,
            target_h,
        )
        .to_image());
    }

    let window = nudge_off_kernel_zero(window, target_w, filter);
    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .map_err(|err| Error::Resample(format!("invalid source view: {err}")))?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(filter.algorithm())
        .crop(window.left, window.top, window.width, window.height);
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .map_err(|err| Error::Resample(err.to_string()))?;
    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| Error::Resample("resized buffer has unexpected length".into()))
}
