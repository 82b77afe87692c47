//! Color and intensity transforms.
//!
//! Every function here keeps the input dimensions and works on 8-bit
//! RGB samples. Intermediate arithmetic is done in `f32` and clamped
//! back to `0..=255`.
//!
//! Contrast-limited equalization ([`clahe`]) works on luma only and
//! shifts all three channels by the same amount, so hue is roughly
//! preserved. Plain [`equalize`] equalizes each channel independently.

use image::{GrayImage, Luma, Rgb};

use crate::types::RgbImage;

/// Round and clamp an `f32` sample into the `u8` range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Rec. 601 luma of an RGB pixel, in `0.0..=255.0`.
fn luma(pixel: Rgb<u8>) -> f32 {
    let [r, g, b] = pixel.0;
    0.114f32.mul_add(f32::from(b), 0.299f32.mul_add(f32::from(r), 0.587 * f32::from(g)))
}

/// Apply `out = alpha * in + beta` to every sample.
///
/// `alpha` scales contrast (1.0 is unchanged); `beta` is an additive
/// brightness offset in sample units.
#[must_use = "returns the adjusted image"]
pub fn brightness_contrast(image: &RgbImage, alpha: f32, beta: f32) -> RgbImage {
    let lut: [u8; 256] = std::array::from_fn(|v| {
        #[allow(clippy::cast_precision_loss)]
        let v = v as f32;
        clamp_u8(alpha.mul_add(v, beta))
    });
    map_samples(image, &lut)
}

/// Reorder the channels: output channel `c` takes input channel
/// `order[c]`. Indices outside `0..3` are wrapped.
#[must_use = "returns the shuffled image"]
pub fn channel_shuffle(image: &RgbImage, order: [usize; 3]) -> RgbImage {
    let order = order.map(|c| c % 3);
    let mut out = image.clone();
    for (dst, src) in out.pixels_mut().zip(image.pixels()) {
        *dst = Rgb([src.0[order[0]], src.0[order[1]], src.0[order[2]]]);
    }
    out
}

/// Add a fixed offset to each channel.
#[must_use = "returns the shifted image"]
pub fn rgb_shift(image: &RgbImage, shift: [i16; 3]) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for (sample, delta) in pixel.0.iter_mut().zip(shift) {
            *sample = clamp_u8(f32::from(*sample) + f32::from(delta));
        }
    }
    out
}

/// Shift hue (degrees), saturation and value (both in sample units,
/// `-255..=255`) in HSV space.
#[must_use = "returns the adjusted image"]
pub fn hue_saturation_value(
    image: &RgbImage,
    hue_shift: f32,
    sat_shift: f32,
    val_shift: f32,
) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let (h, s, v) = rgb_to_hsv(*pixel);
        let h = (h + hue_shift).rem_euclid(360.0);
        let s = (s + sat_shift / 255.0).clamp(0.0, 1.0);
        let v = (v + val_shift / 255.0).clamp(0.0, 1.0);
        *pixel = hsv_to_rgb(h, s, v);
    }
    out
}

/// Convert to grayscale while keeping three identical channels.
#[must_use = "returns the grayscale image"]
pub fn to_gray(image: &RgbImage) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let y = clamp_u8(luma(*pixel));
        *pixel = Rgb([y, y, y]);
    }
    out
}

/// Keep only the `bits` most significant bits of every sample.
///
/// `bits` is clamped to `1..=8`.
#[must_use = "returns the posterized image"]
pub fn posterize(image: &RgbImage, bits: u8) -> RgbImage {
    let bits = bits.clamp(1, 8);
    let mask = !(0xFF_u8.checked_shr(u32::from(bits)).unwrap_or(0));
    let lut: [u8; 256] = std::array::from_fn(|v| {
        #[allow(clippy::cast_possible_truncation)]
        let v = v as u8;
        v & mask
    });
    map_samples(image, &lut)
}

/// Histogram-equalize each channel independently.
///
/// Wraps [`imageproc::contrast::equalize_histogram`], which only accepts
/// `GrayImage`, by splitting and reassembling the channels.
#[must_use = "returns the equalized image"]
pub fn equalize(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    let channels: [GrayImage; 3] = std::array::from_fn(|c| {
        let plane = GrayImage::from_fn(w, h, |x, y| Luma([image.get_pixel(x, y).0[c]]));
        imageproc::contrast::equalize_histogram(&plane)
    });
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([
            channels[0].get_pixel(x, y).0[0],
            channels[1].get_pixel(x, y).0[0],
            channels[2].get_pixel(x, y).0[0],
        ])
    })
}

/// Contrast-limited adaptive histogram equalization on luma.
///
/// The image is split into a `grid` × `grid` layout of tiles. Each tile
/// gets an equalization lookup table built from its luma histogram with
/// every bin clipped at `clip_limit` times the mean bin height (the
/// excess is spread evenly over all bins). Per-pixel luma is mapped by
/// bilinear interpolation between the four nearest tile tables, and the
/// resulting luma change is added to all three channels.
#[must_use = "returns the equalized image"]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn clahe(image: &RgbImage, clip_limit: f32, grid: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }

    let grid = grid.clamp(1, w.min(h));
    let tile_w = w.div_ceil(grid);
    let tile_h = h.div_ceil(grid);
    let tiles_x = w.div_ceil(tile_w);
    let tiles_y = h.div_ceil(tile_h);

    let lumas: Vec<u8> = image.pixels().map(|p| clamp_u8(luma(*p))).collect();

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x_end = ((tx + 1) * tile_w).min(w);
            let y_end = ((ty + 1) * tile_h).min(h);
            let mut hist = [0u32; 256];
            for y in ty * tile_h..y_end {
                for x in tx * tile_w..x_end {
                    hist[usize::from(lumas[(y * w + x) as usize])] += 1;
                }
            }
            let area = (x_end - tx * tile_w) * (y_end - ty * tile_h);
            luts.push(clipped_equalization_lut(&hist, area, clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];
    // Tile coordinate of a pixel, measured between tile centers.
    let locate = |pos: u32, tile: u32, tiles: u32| -> (u32, u32, f32) {
        let f = ((pos as f32 + 0.5) / tile as f32 - 0.5).max(0.0);
        let lo = (f.floor() as u32).min(tiles - 1);
        let hi = (lo + 1).min(tiles - 1);
        let t = (f - lo as f32).clamp(0.0, 1.0);
        (lo, hi, t)
    };

    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let v = usize::from(lumas[(y * w + x) as usize]);
        let (x0, x1, wx) = locate(x, tile_w, tiles_x);
        let (y0, y1, wy) = locate(y, tile_h, tiles_y);
        let top = f32::from(lut_at(x0, y0)[v])
            .mul_add(1.0 - wx, f32::from(lut_at(x1, y0)[v]) * wx);
        let bottom = f32::from(lut_at(x0, y1)[v])
            .mul_add(1.0 - wx, f32::from(lut_at(x1, y1)[v]) * wx);
        let mapped = top.mul_add(1.0 - wy, bottom * wy);
        let delta = mapped - v as f32;
        for sample in &mut pixel.0 {
            *sample = clamp_u8(f32::from(*sample) + delta);
        }
    }
    out
}

/// Build an equalization LUT from a histogram with clipped bins.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clipped_equalization_lut(hist: &[u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    if area == 0 {
        return std::array::from_fn(|v| v as u8);
    }

    let limit = ((clip_limit * area as f32 / 256.0).ceil() as u32).max(1);
    let mut clipped = *hist;
    let mut excess = 0u32;
    for bin in &mut clipped {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let share = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, bin) in clipped.iter_mut().enumerate() {
        *bin += share + u32::from(i < remainder);
    }

    let mut lut = [0u8; 256];
    let mut cdf = 0u32;
    for (entry, bin) in lut.iter_mut().zip(clipped) {
        cdf += bin;
        *entry = clamp_u8(cdf as f32 * 255.0 / area as f32);
    }
    lut
}

fn map_samples(image: &RgbImage, lut: &[u8; 256]) -> RgbImage {
    let mut out = image.clone();
    for sample in out.iter_mut() {
        *sample = lut[usize::from(*sample)];
    }
    out
}

/// RGB to HSV with hue in degrees `0..360` and saturation/value in `0..=1`.
fn rgb_to_hsv(pixel: Rgb<u8>) -> (f32, f32, f32) {
    let [r, g, b] = pixel.0.map(|c| f32::from(c) / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta <= f32::EPSILON {
        0.0
    } else if (max - r).abs() <= f32::EPSILON {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if (max - g).abs() <= f32::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max <= f32::EPSILON { 0.0 } else { delta / max };
    (hue, saturation, max)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Rgb<u8> {
    let c = value * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match h.floor() as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    Rgb([r, g, b].map(|ch| clamp_u8((ch + m) * 255.0)))
}
