use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shape_mask::config::ResizeFilter;
use shape_mask::processing::composite::place_layer;
use shape_mask::{
    CompositeMode, CompositeOptions, RasterImage, Transform, composite, composite_with, fit_scale,
};

fn solid(w: u32, h: u32, px: [u8; 4]) -> RasterImage {
    RasterImage::new(RgbaImage::from_pixel(w, h, Rgba(px))).unwrap()
}

fn noise(rng: &mut StdRng, w: u32, h: u32) -> RasterImage {
    let mut img = RgbaImage::new(w, h);
    for px in img.pixels_mut() {
        *px = Rgba([rng.random(), rng.random(), rng.random(), rng.random()]);
    }
    RasterImage::new(img).unwrap()
}

/// Mask with a hard-edged core, an antialiased ring and a transparent border.
fn soft_disc(size: u32) -> RasterImage {
    let c = size as f32 / 2.0;
    let mut img = RgbaImage::new(size, size);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let d = ((x as f32 + 0.5 - c).powi(2) + (y as f32 + 0.5 - c).powi(2)).sqrt();
        let a = ((c * 0.8 - d) / 4.0).clamp(0.0, 1.0);
        *px = Rgba([0, 0, 0, (a * 255.0).round() as u8]);
    }
    RasterImage::new(img).unwrap()
}

fn random_transform(rng: &mut StdRng) -> Transform {
    Transform::new(
        rng.random_range(0.05..4.0),
        rng.random_range(-80.0..80.0),
        rng.random_range(-80.0..80.0),
    )
}

const FILTERS: [ResizeFilter; 4] = [
    ResizeFilter::Nearest,
    ResizeFilter::Bilinear,
    ResizeFilter::CatmullRom,
    ResizeFilter::Lanczos3,
];

#[test]
fn preview_matches_final_inside_silhouette() {
    let mut rng = StdRng::seed_from_u64(11);
    let mask = soft_disc(64);
    for _ in 0..24 {
        let (w, h) = (rng.random_range(1..90), rng.random_range(1..90));
        let repl = noise(&mut rng, w, h);
        let t = random_transform(&mut rng);
        let preview = composite(&mask, &repl, &t, CompositeMode::Preview).unwrap();
        let fin = composite(&mask, &repl, &t, CompositeMode::Final).unwrap();
        for (x, y, m) in mask.pixels().enumerate_pixels() {
            if m[3] > 0 {
                assert_eq!(
                    preview.image().get_pixel(x, y),
                    fin.image().get_pixel(x, y),
                    "pixel ({x}, {y}) with {t:?}"
                );
            }
        }
    }
}

#[test]
fn antialiased_edge_preview_matches_final() {
    let mut mask = RgbaImage::new(3, 1);
    mask.put_pixel(0, 0, Rgba([0, 0, 0, 128]));
    mask.put_pixel(1, 0, Rgba([0, 0, 0, 1]));
    let mask = RasterImage::new(mask).unwrap();
    let repl = solid(3, 1, [200, 100, 50, 255]);
    let t = Transform::default();
    let preview = composite(&mask, &repl, &t, CompositeMode::Preview).unwrap();
    let fin = composite(&mask, &repl, &t, CompositeMode::Final).unwrap();
    let alphas = |img: &RgbaImage| img.pixels().map(|px| px[3]).collect::<Vec<_>>();
    assert_eq!(alphas(fin.image()), [128, 1, 0]);
    assert_eq!(alphas(preview.image()), [128, 1, 77]);
}

/// Small replacements blown up far past the fit scale and dragged by
/// fractional amounts, so the visible window is a sub-pixel slice of the source.
#[test]
fn deep_zoom_with_fractional_drag_composites_for_every_filter() {
    let mut rng = StdRng::seed_from_u64(15);
    let masks = [
        solid(64, 48, [0, 0, 0, 255]),
        soft_disc(40),
        solid(512, 512, [0, 0, 0, 255]),
    ];
    for mask in &masks {
        for _ in 0..12 {
            let (w, h) = (rng.random_range(1..48), rng.random_range(1..48));
            let repl = noise(&mut rng, w, h);
            let fit = fit_scale(mask, &repl);
            let zoom = [1.0, 2.0, 5.0, 17.5, 100.0][rng.random_range(0..5)];
            // Quarter-pixel drags land sample centres exactly on source pixels.
            let (mw, mh) = (mask.width() as f32, mask.height() as f32);
            let dx = (rng.random_range(-mw..mw) * 4.0).round() / 4.0;
            let dy = (rng.random_range(-mh..mh) * 4.0).round() / 4.0;
            let t = Transform::new(fit * zoom, dx, dy);
            for filter in FILTERS {
                let options = CompositeOptions {
                    filter,
                    ..CompositeOptions::default()
                };
                for mode in [CompositeMode::Preview, CompositeMode::Final] {
                    let out = composite_with(mask, &repl, &t, mode, &options)
                        .unwrap_or_else(|err| panic!("{filter:?} {w}x{h} {t:?}: {err}"));
                    assert_eq!(out.image().dimensions(), mask.dimensions());
                }
            }
        }
    }
}

#[test]
fn tiny_replacement_zoomed_and_dragged_keeps_its_colour() {
    let mask = solid(64, 48, [0, 0, 0, 255]);
    let repl = solid(3, 5, [10, 200, 30, 255]);
    let fit = fit_scale(&mask, &repl);
    let t = Transform::new(fit * 2.0, -31.5, 23.5);
    for filter in FILTERS {
        let options = CompositeOptions {
            filter,
            ..CompositeOptions::default()
        };
        let fin = composite_with(&mask, &repl, &t, CompositeMode::Final, &options).unwrap();
        let covered: Vec<_> = fin.image().pixels().filter(|px| px[3] > 0).collect();
        assert!(!covered.is_empty(), "{filter:?}");
        for px in covered {
            assert!(px[1] >= 198 && px[1] <= 202, "{filter:?}: {px:?}");
        }
    }
}

#[test]
fn final_alpha_is_contained_and_bounded() {
    let mut rng = StdRng::seed_from_u64(12);
    let mask = soft_disc(48);
    for filter in FILTERS {
        let options = CompositeOptions {
            filter,
            ..CompositeOptions::default()
        };
        for _ in 0..8 {
            let (w, h) = (rng.random_range(1..70), rng.random_range(1..70));
            let repl = noise(&mut rng, w, h);
            let t = random_transform(&mut rng);
            let layer = place_layer(mask.dimensions(), &repl, &t, filter).unwrap();
            let fin = composite_with(&mask, &repl, &t, CompositeMode::Final, &options).unwrap();
            for (x, y, out) in fin.image().enumerate_pixels() {
                let m = mask.alpha_at(x, y).unwrap();
                let r = layer.get_pixel(x, y)[3];
                if m == 0 {
                    assert_eq!(out, &Rgba([0, 0, 0, 0]), "({x}, {y}) leaked outside mask");
                }
                assert!(out[3] <= m.min(r), "({x}, {y}): {} > min({r}, {m})", out[3]);
            }
        }
    }
}

#[test]
fn preview_ghost_is_not_attenuated_by_mask() {
    // Empty mask: every preview pixel is pure ghost.
    let mask = RasterImage::new(RgbaImage::new(10, 10)).unwrap();
    let repl = solid(10, 10, [40, 80, 120, 255]);
    let preview = composite(&mask, &repl, &Transform::default(), CompositeMode::Preview).unwrap();
    assert!(preview.image().pixels().all(|px| *px == Rgba([40, 80, 120, 77])));
}

#[test]
fn re_render_is_bit_identical() {
    let mut rng = StdRng::seed_from_u64(13);
    let mask = soft_disc(40);
    let repl = noise(&mut rng, 57, 33);
    let t = Transform::new(0.83, 3.25, -7.5);
    for mode in [CompositeMode::Preview, CompositeMode::Final] {
        let a = composite(&mask, &repl, &t, mode).unwrap();
        let b = composite(&mask, &repl, &t, mode).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn output_is_always_mask_sized() {
    let mask = solid(31, 17, [0, 0, 0, 255]);
    for (w, h) in [(1, 1), (500, 3), (3, 500), (31, 17)] {
        let repl = solid(w, h, [1, 1, 1, 255]);
        let out = composite(&mask, &repl, &Transform::new(1.7, 2.0, 2.0), CompositeMode::Final)
            .unwrap();
        assert_eq!(out.image().dimensions(), (31, 17));
    }
}

#[test]
fn fit_scale_spans_one_axis_and_stays_inside() {
    let mut rng = StdRng::seed_from_u64(14);
    for _ in 0..200 {
        let mask = RasterImage::new(RgbaImage::new(rng.random_range(1..400), rng.random_range(1..400)))
            .unwrap();
        let repl = RasterImage::new(RgbaImage::new(rng.random_range(1..900), rng.random_range(1..900)))
            .unwrap();
        let s = fit_scale(&mask, &repl);
        let (mw, mh) = (mask.width() as f32, mask.height() as f32);
        let (sw, sh) = (repl.width() as f32 * s, repl.height() as f32 * s);
        let eps = 1e-3 * mw.max(mh);
        assert!(sw <= mw + eps && sh <= mh + eps);
        assert!((sw - mw).abs() <= eps || (sh - mh).abs() <= eps);

        let p = Transform::new(s, 0.0, 0.0).placement(mask.dimensions(), repl.dimensions());
        assert!(p.x >= -eps && p.y >= -eps);
        assert!(p.right() <= mw + eps && p.bottom() <= mh + eps);
    }
}

#[test]
fn square_replacement_fits_centred_in_wide_mask() {
    let mask = solid(200, 100, [0, 0, 0, 255]);
    let repl = solid(400, 400, [255, 0, 0, 255]);
    let s = fit_scale(&mask, &repl);
    assert!((s - 0.25).abs() < f32::EPSILON);

    let fin = composite(&mask, &repl, &Transform::new(s, 0.0, 0.0), CompositeMode::Final).unwrap();
    let img = fin.image();
    assert_eq!(img.dimensions(), (200, 100));
    // Fit-inside: the 100x100 square sits centred, the sides stay empty.
    for (x, y, px) in img.enumerate_pixels() {
        if (50..150).contains(&x) {
            assert!(px[0] >= 254 && px[3] >= 254, "({x}, {y}): {px:?}");
        } else {
            assert_eq!(px[3], 0, "({x}, {y}): {px:?}");
        }
    }
}

#[test]
fn matching_aspect_replacement_fills_whole_mask() {
    let mask = solid(200, 100, [0, 0, 0, 255]);
    let repl = solid(400, 200, [255, 0, 0, 255]);
    let s = fit_scale(&mask, &repl);
    assert!((s - 0.5).abs() < f32::EPSILON);
    let fin = composite(&mask, &repl, &Transform::new(s, 0.0, 0.0), CompositeMode::Final).unwrap();
    assert!(
        fin.image()
            .pixels()
            .all(|px| px[0] >= 254 && px[1] <= 1 && px[2] <= 1 && px[3] >= 254)
    );
}

#[test]
fn replacement_dragged_off_frame_leaves_it_transparent() {
    let mask = solid(200, 100, [0, 0, 0, 255]);
    let repl = solid(400, 400, [255, 0, 0, 255]);
    let t = Transform::new(0.25, 1000.0, 1000.0);
    let fin = composite(&mask, &repl, &t, CompositeMode::Final).unwrap();
    assert!(fin.image().pixels().all(|px| px[3] == 0));
    let preview = composite(&mask, &repl, &t, CompositeMode::Preview).unwrap();
    assert!(preview.image().pixels().all(|px| px[3] == 0));
}

#[test]
fn circle_mask_clips_replacement_at_unit_scale() {
    let r = 30.0_f32;
    let mut mask = RgbaImage::new(100, 100);
    for (x, y, px) in mask.enumerate_pixels_mut() {
        let d = ((x as f32 + 0.5 - 50.0).powi(2) + (y as f32 + 0.5 - 50.0).powi(2)).sqrt();
        let a = if d <= r { 255 } else { 0 };
        *px = Rgba([255, 255, 255, a]);
    }
    let mask = RasterImage::new(mask).unwrap();
    let repl = solid(100, 100, [0, 0, 255, 255]);
    let fin = composite(&mask, &repl, &Transform::default(), CompositeMode::Final).unwrap();
    for (x, y, px) in fin.image().enumerate_pixels() {
        if mask.alpha_at(x, y) == Some(255) {
            assert_eq!(px, &Rgba([0, 0, 255, 255]));
        } else {
            assert_eq!(px, &Rgba([0, 0, 0, 0]));
        }
    }
}
