//! Non-rigid distortions: lens (optical), grid, and elastic.
//!
//! All three are expressed as an output-to-input coordinate mapping and
//! resampled with [`imageproc::geometric_transformations::warp_with`]
//! using bilinear interpolation. Samples that fall outside the source
//! are black.

use image::Rgb;
use imageproc::geometric_transformations::{Interpolation, warp_with};
use rand::Rng;

use crate::types::RgbImage;

const BORDER: Rgb<u8> = Rgb([0, 0, 0]);

/// Radial lens distortion.
///
/// `k` is the radial coefficient: positive values pull the edges in
/// (pincushion sampling), negative values push them out (barrel). The
/// distortion center is the image center offset by (`shift_x`,
/// `shift_y`) pixels. Radii are normalized by the image dimensions.
#[must_use = "returns the distorted image"]
#[allow(clippy::cast_precision_loss)]
pub fn optical(image: &RgbImage, k: f32, shift_x: f32, shift_y: f32) -> RgbImage {
    if k == 0.0 {
        return image.clone();
    }
    let w = (image.width() as f32).max(1.0);
    let h = (image.height() as f32).max(1.0);
    let cx = w / 2.0 + shift_x;
    let cy = h / 2.0 + shift_y;
    warp_with(
        image,
        move |x, y| {
            let nx = (x - cx) / w;
            let ny = (y - cy) / h;
            let factor = k.mul_add(nx.mul_add(nx, ny * ny), 1.0);
            (nx.mul_add(factor * w, cx), ny.mul_add(factor * h, cy))
        },
        Interpolation::Bilinear,
        BORDER,
    )
}

/// Grid distortion.
///
/// The image is divided into `x_steps.len()` columns and
/// `y_steps.len()` rows of equal size. Each step is the relative size
/// of the matching source cell (1.0 keeps the cell, >1.0 stretches the
/// source region sampled into it). Step sizes are renormalized so the
/// whole image is still covered.
#[must_use = "returns the distorted image"]
pub fn grid(image: &RgbImage, x_steps: &[f32], y_steps: &[f32]) -> RgbImage {
    let x_map = axis_map(image.width(), x_steps);
    let y_map = axis_map(image.height(), y_steps);
    warp_with(
        image,
        move |x, y| (lookup(&x_map, x), lookup(&y_map, y)),
        Interpolation::Bilinear,
        BORDER,
    )
}

/// Map each output position along one axis to a source position.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn axis_map(len: u32, steps: &[f32]) -> Vec<f32> {
    let identity = || (0..len).map(|p| p as f32).collect();
    if steps.is_empty() || len == 0 {
        return identity();
    }

    let cell = len as f32 / steps.len() as f32;
    let mut bounds = Vec::with_capacity(steps.len() + 1);
    bounds.push(0.0f32);
    let mut acc = 0.0f32;
    for step in steps {
        acc += cell * step.max(0.0);
        bounds.push(acc);
    }
    if acc <= f32::EPSILON || !acc.is_finite() {
        return identity();
    }
    let scale = len as f32 / acc;
    for b in &mut bounds {
        *b *= scale;
    }

    (0..len)
        .map(|p| {
            let pf = p as f32;
            let i = ((pf / cell) as usize).min(steps.len() - 1);
            let t = (pf - i as f32 * cell) / cell;
            (bounds[i + 1] - bounds[i]).mul_add(t, bounds[i])
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lookup(map: &[f32], pos: f32) -> f32 {
    let idx = (pos.max(0.0) as usize).min(map.len().saturating_sub(1));
    map.get(idx).copied().unwrap_or(pos)
}

/// A smooth random displacement field for [`elastic`].
///
/// Displacements are drawn uniformly from `-alpha..=alpha` on a coarse
/// lattice with `sigma`-pixel spacing and bilinearly interpolated in
/// between, which approximates Gaussian-smoothed white noise.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticField {
    spacing: f32,
    cols: usize,
    rows: usize,
    dx: Vec<f32>,
    dy: Vec<f32>,
}

impl ElasticField {
    /// Draw a random field covering a `width` × `height` image.
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        width: u32,
        height: u32,
        alpha: f32,
        sigma: f32,
    ) -> Self {
        let alpha = if alpha.is_finite() { alpha.abs() } else { 0.0 };
        let mut field = Self::zero(width, height, sigma);
        for d in field.dx.iter_mut().chain(field.dy.iter_mut()) {
            *d = rng.gen_range(-alpha..=alpha);
        }
        field
    }

    /// A field with no displacement anywhere.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn zero(width: u32, height: u32, sigma: f32) -> Self {
        let spacing = if sigma.is_finite() { sigma.max(1.0) } else { 1.0 };
        let cols = (width as f32 / spacing).ceil() as usize + 2;
        let rows = (height as f32 / spacing).ceil() as usize + 2;
        Self {
            spacing,
            cols,
            rows,
            dx: vec![0.0; cols * rows],
            dy: vec![0.0; cols * rows],
        }
    }

    /// Interpolated displacement at output position (`x`, `y`).
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn displacement(&self, x: f32, y: f32) -> (f32, f32) {
        let gx = (x / self.spacing).max(0.0);
        let gy = (y / self.spacing).max(0.0);
        let c0 = (gx as usize).min(self.cols - 2);
        let r0 = (gy as usize).min(self.rows - 2);
        let tx = (gx - c0 as f32).clamp(0.0, 1.0);
        let ty = (gy - r0 as f32).clamp(0.0, 1.0);
        let sample = |field: &[f32]| {
            let at = |c: usize, r: usize| field[r * self.cols + c];
            let top = at(c0, r0).mul_add(1.0 - tx, at(c0 + 1, r0) * tx);
            let bottom = at(c0, r0 + 1).mul_add(1.0 - tx, at(c0 + 1, r0 + 1) * tx);
            top.mul_add(1.0 - ty, bottom * ty)
        };
        (sample(&self.dx), sample(&self.dy))
    }
}

/// Displace every pixel by `field`.
#[must_use = "returns the distorted image"]
pub fn elastic(image: &RgbImage, field: &ElasticField) -> RgbImage {
    warp_with(
        image,
        |x, y| {
            let (dx, dy) = field.displacement(x, y);
            (x + dx, y + dy)
        },
        Interpolation::Bilinear,
        BORDER,
    )
}
