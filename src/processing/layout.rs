//! Placement geometry shared by preview and final composites.

/// Uniform scale that fits a `src_w x src_h` image inside a `frame_w x frame_h`
/// frame without exceeding it on either axis.
#[must_use]
pub fn fit_scale(frame_w: u32, frame_h: u32, src_w: u32, src_h: u32) -> f32 {
    let iw = src_w.max(1) as f32;
    let ih = src_h.max(1) as f32;
    let fw = frame_w.max(1) as f32;
    let fh = frame_h.max(1) as f32;
    (fw / iw).min(fh / ih)
}

/// Top-left corner that centres `inner` inside `outer`, in floating point.
#[must_use]
pub fn center_offset(inner_w: f32, inner_h: f32, outer_w: u32, outer_h: u32) -> (f32, f32) {
    ((outer_w as f32 - inner_w) / 2.0, (outer_h as f32 - inner_h) / 2.0)
}

/// Where the scaled replacement lands in the mask frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Scale that produced `width`/`height` from the source dimensions.
    pub scale: f32,
}

/// Integer rectangle inside the mask frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Sub-rectangle of the source image, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceWindow {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

const MIN_SOURCE_SPAN: f64 = 1.0 / 1024.0;

impl SourceWindow {
    /// Whether the window starts on a pixel boundary and spans exactly
    /// `width x height` whole pixels.
    #[must_use]
    pub fn is_pixel_aligned(&self, width: u32, height: u32) -> bool {
        self.left.fract() == 0.0
            && self.top.fract() == 0.0
            && self.width == f64::from(width)
            && self.height == f64::from(height)
    }
}

impl Placement {
    /// Centre a `src_w x src_h` image scaled by `scale` over the frame, then
    /// displace it by `(offset_x, offset_y)`.
    #[must_use]
    pub fn new(
        frame: (u32, u32),
        source: (u32, u32),
        scale: f32,
        offset_x: f32,
        offset_y: f32,
    ) -> Self {
        let width = source.0 as f32 * scale;
        let height = source.1 as f32 * scale;
        let (cx, cy) = center_offset(width, height, frame.0, frame.1);
        Self {
            x: cx + offset_x,
            y: cy + offset_y,
            width,
            height,
            scale,
        }
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// The pixels of the frame the placement covers, or `None` when it lies
    /// entirely outside.
    #[must_use]
    pub fn clip_to_frame(&self, frame_w: u32, frame_h: u32) -> Option<PixelRect> {
        let x0 = self.x.round().max(0.0);
        let y0 = self.y.round().max(0.0);
        let x1 = self.right().round().min(frame_w as f32);
        let y1 = self.bottom().round().min(frame_h as f32);
        if !(x1 > x0 && y1 > y0) {
            return None;
        }
        Some(PixelRect {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    /// Map a destination rectangle back into source pixels, clamped to the
    /// source bounds.
    #[must_use]
    pub fn source_window(&self, dest: PixelRect, src_w: u32, src_h: u32) -> SourceWindow {
        let scale = f64::from(self.scale);
        let (sw, sh) = (f64::from(src_w), f64::from(src_h));
        let left = ((f64::from(dest.x) - f64::from(self.x)) / scale).clamp(0.0, sw - MIN_SOURCE_SPAN);
        let top = ((f64::from(dest.y) - f64::from(self.y)) / scale).clamp(0.0, sh - MIN_SOURCE_SPAN);
        let width = (f64::from(dest.width) / scale).clamp(MIN_SOURCE_SPAN, sw - left);
        let height = (f64::from(dest.height) / scale).clamp(MIN_SOURCE_SPAN, sh - top);
        SourceWindow {
            left,
            top,
            width,
            height,
        }
    }
}
