//! Additive Gaussian noise.
//!
//! Wraps [`imageproc::noise::gaussian_noise`]. The noise generator is
//! seeded explicitly so a caller holding a seeded RNG gets reproducible
//! output.

use crate::types::RgbImage;

/// Add zero-mean Gaussian noise with the given `variance` (in squared
/// sample units) to every sample.
///
/// Non-positive variance returns the image unchanged.
#[must_use = "returns the noisy image"]
pub fn gaussian_noise(image: &RgbImage, variance: f32, seed: u64) -> RgbImage {
    if variance <= 0.0 {
        return image.clone();
    }
    imageproc::noise::gaussian_noise(image, 0.0, f64::from(variance).sqrt(), seed)
}
