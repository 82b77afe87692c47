//! Occlusion and weather effects: dropout holes, fog, shadows, and
//! sun flare.
//!
//! Each effect is split into a geometry description (drawn at random
//! by the `random_*` constructors) and a deterministic rendering
//! function, so the rendering can be tested with fixed geometry.

use image::{GrayImage, Luma, Rgb};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use rand::Rng;

use crate::color::clamp_u8;
use crate::types::RgbImage;

/// Blend a pixel toward white by `weight` (0.0 keeps it, 1.0 is white).
fn toward_white(pixel: &mut Rgb<u8>, weight: f32) {
    let weight = weight.clamp(0.0, 1.0);
    for sample in &mut pixel.0 {
        let s = f32::from(*sample);
        *sample = clamp_u8((255.0 - s).mul_add(weight, s));
    }
}

// ───────────────────────── Coarse dropout ──────────────────────────

/// A rectangular region to black out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hole {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Draw `count` holes with sides in `min_size..=max_size`, clipped to
/// the image.
pub fn random_holes<R: Rng + ?Sized>(
    rng: &mut R,
    width: u32,
    height: u32,
    count: u32,
    min_size: u32,
    max_size: u32,
) -> Vec<Hole> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let (lo, hi) = (min_size.min(max_size).max(1), min_size.max(max_size).max(1));
    (0..count)
        .map(|_| {
            let w = rng.gen_range(lo..=hi).min(width);
            let h = rng.gen_range(lo..=hi).min(height);
            Hole {
                x: rng.gen_range(0..=width - w),
                y: rng.gen_range(0..=height - h),
                width: w,
                height: h,
            }
        })
        .collect()
}

/// Fill every hole with black.
#[must_use = "returns the occluded image"]
#[allow(clippy::cast_possible_wrap)]
pub fn coarse_dropout(image: &RgbImage, holes: &[Hole]) -> RgbImage {
    let mut out = image.clone();
    for hole in holes.iter().filter(|h| h.width > 0 && h.height > 0) {
        let rect = Rect::at(hole.x as i32, hole.y as i32).of_size(hole.width, hole.height);
        draw_filled_rect_mut(&mut out, rect, Rgb([0, 0, 0]));
    }
    out
}

// ───────────────────────── Fog ──────────────────────────

/// A soft white disc of haze.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazeBlob {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    /// Peak opacity at the blob center.
    pub alpha: f32,
}

/// Scatter haze blobs whose size grows with `fog_coef` and whose
/// opacity is `fog_coef * alpha_coef` scaled into a visible range.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn random_fog<R: Rng + ?Sized>(
    rng: &mut R,
    width: u32,
    height: u32,
    fog_coef: f32,
    alpha_coef: f32,
) -> Vec<HazeBlob> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let (w, h) = (width as f32, height as f32);
    let fog_coef = fog_coef.clamp(0.0, 1.0);
    let radius = (w.min(h) * fog_coef / 2.0).max(1.0);
    let count = ((w * h) / (radius * radius)).ceil().clamp(1.0, 64.0) as usize;
    let alpha = (alpha_coef * fog_coef * 10.0).clamp(0.0, 1.0);
    (0..count)
        .map(|_| HazeBlob {
            cx: rng.gen_range(0.0..w),
            cy: rng.gen_range(0.0..h),
            radius,
            alpha,
        })
        .collect()
}

/// Render haze blobs with a linear falloff from center to rim.
#[must_use = "returns the fogged image"]
#[allow(clippy::cast_precision_loss)]
pub fn fog(image: &RgbImage, blobs: &[HazeBlob]) -> RgbImage {
    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let (px, py) = (x as f32, y as f32);
        for blob in blobs {
            let d = (px - blob.cx).hypot(py - blob.cy);
            if d < blob.radius {
                toward_white(pixel, blob.alpha * (1.0 - d / blob.radius));
            }
        }
    }
    out
}

// ───────────────────────── Shadow ──────────────────────────

/// Draw a quadrilateral spanning from a random row in the lower half
/// to the bottom edge. Returns an empty polygon for images smaller than
/// 2 × 2.
#[allow(clippy::cast_possible_wrap)]
pub fn random_shadow<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32) -> Vec<(i32, i32)> {
    if width < 2 || height < 2 {
        return Vec::new();
    }
    let bottom = height - 1;
    let top = rng.gen_range((height / 2).min(bottom - 1)..bottom);
    let mut xs = [0u32; 4];
    for x in &mut xs {
        *x = rng.gen_range(0..width);
    }
    xs[..2].sort_unstable();
    xs[2..].sort_unstable_by(|a, b| b.cmp(a));
    vec![
        (xs[0] as i32, top as i32),
        (xs[1] as i32, top as i32),
        (xs[2] as i32, bottom as i32),
        (xs[3] as i32, bottom as i32),
    ]
}

/// Multiply samples inside `polygon` by `1.0 - darkness`.
///
/// Polygons with fewer than three vertices, or whose first and last
/// vertices coincide, leave the image unchanged.
#[must_use = "returns the shadowed image"]
pub fn shadow(image: &RgbImage, polygon: &[(i32, i32)], darkness: f32) -> RgbImage {
    if polygon.len() < 3 || polygon.first() == polygon.last() {
        return image.clone();
    }
    let points: Vec<Point<i32>> = polygon.iter().map(|&(x, y)| Point::new(x, y)).collect();
    let mut mask = GrayImage::new(image.width(), image.height());
    draw_polygon_mut(&mut mask, &points, Luma([255]));

    let keep = 1.0 - darkness.clamp(0.0, 1.0);
    let mut out = image.clone();
    for (pixel, m) in out.pixels_mut().zip(mask.pixels()) {
        if m.0[0] > 0 {
            for sample in &mut pixel.0 {
                *sample = clamp_u8(f32::from(*sample) * keep);
            }
        }
    }
    out
}

// ───────────────────────── Sun flare ──────────────────────────

/// A bright radial glow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flare {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    /// Peak whitening at the center.
    pub intensity: f32,
}

/// Place a flare somewhere in the top half of the image.
#[allow(clippy::cast_precision_loss)]
pub fn random_flare<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32) -> Option<Flare> {
    if width == 0 || height == 0 {
        return None;
    }
    let (w, h) = (width as f32, height as f32);
    Some(Flare {
        cx: rng.gen_range(0.0..w),
        cy: rng.gen_range(0.0..(h / 2.0).max(1.0)),
        radius: (w.min(h) * rng.gen_range(0.15..=0.4)).max(1.0),
        intensity: rng.gen_range(0.6..=0.9),
    })
}

/// Whiten pixels around the flare center with a quadratic falloff.
#[must_use = "returns the flared image"]
#[allow(clippy::cast_precision_loss)]
pub fn sun_flare(image: &RgbImage, flare: &Flare) -> RgbImage {
    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let d = (x as f32 - flare.cx).hypot(y as f32 - flare.cy);
        if d < flare.radius {
            let falloff = 1.0 - d / flare.radius;
            toward_white(pixel, flare.intensity * falloff * falloff);
        }
    }
    out
}
