//! Probabilistic operations and the transform groups built from them.
//!
//! An [`Operation`] names one pixel-level transform and its parameter
//! ranges. A [`Step`] pairs an operation with the probability that it
//! fires. A [`TransformGroup`] runs its steps in order as one atomic
//! stage: every step rolls independently, and the result is whatever
//! the fired steps produced (possibly the unchanged input).
//!
//! Random parameters are drawn from the caller's RNG at application
//! time, so one seeded RNG makes a whole run reproducible.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::types::RgbImage;
use crate::{color, distort, geometric, noise, occlude};

/// One pixel-level transform with its parameter ranges.
///
/// Symmetric `*_limit` fields draw uniformly from `-limit..=limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    HorizontalFlip,
    VerticalFlip,
    /// Rotate by a random multiple of 90°.
    RandomRotate90,
    Transpose,
    /// Randomly permute the three color channels.
    ChannelShuffle,
    Rotate {
        limit_degrees: f32,
    },
    /// Brightness offset as a fraction of full scale, contrast as a
    /// fractional gain change.
    BrightnessContrast {
        brightness_limit: f32,
        contrast_limit: f32,
    },
    /// Gaussian noise with variance drawn from `var_min..=var_max`.
    GaussNoise {
        var_min: f32,
        var_max: f32,
    },
    /// Translation as a fraction of each dimension, then rotation about
    /// the center. `scale` other than 1.0 is not supported.
    Affine {
        translate_fraction: f32,
        rotate_degrees: f32,
    },
    HueSaturationValue {
        hue_shift_limit: f32,
        sat_shift_limit: f32,
        val_shift_limit: f32,
    },
    RgbShift {
        r_shift_limit: i16,
        g_shift_limit: i16,
        b_shift_limit: i16,
    },
    Clahe {
        clip_limit: f32,
        tile_grid: u32,
    },
    ToGray,
    OpticalDistortion {
        distort_limit: f32,
        shift_limit: f32,
    },
    GridDistortion {
        num_steps: u32,
        distort_limit: f32,
    },
    ElasticTransform {
        alpha: f32,
        sigma: f32,
    },
    CoarseDropout {
        holes: u32,
        min_size: u32,
        max_size: u32,
    },
    Fog {
        coef_min: f32,
        coef_max: f32,
        alpha_coef: f32,
    },
    Shadow {
        darkness: f32,
    },
    SunFlare,
    Posterize {
        bits: u8,
    },
    Equalize,
}

impl Operation {
    /// Apply the operation unconditionally, drawing any random
    /// parameters from `rng`.
    #[must_use = "returns the transformed image"]
    #[allow(clippy::too_many_lines, clippy::cast_precision_loss)]
    pub fn apply<R: Rng + ?Sized>(&self, image: &RgbImage, rng: &mut R) -> RgbImage {
        let (w, h) = image.dimensions();
        match *self {
            Self::HorizontalFlip => geometric::flip_horizontal(image),
            Self::VerticalFlip => geometric::flip_vertical(image),
            Self::RandomRotate90 => geometric::rotate_quarter_turns(image, rng.gen_range(0..4)),
            Self::Transpose => geometric::transpose(image),
            Self::ChannelShuffle => {
                let mut order = [0, 1, 2];
                order.shuffle(rng);
                color::channel_shuffle(image, order)
            }
            Self::Rotate { limit_degrees } => {
                geometric::rotate(image, symmetric(rng, limit_degrees))
            }
            Self::BrightnessContrast {
                brightness_limit,
                contrast_limit,
            } => {
                let alpha = 1.0 + symmetric(rng, contrast_limit);
                let beta = symmetric(rng, brightness_limit) * 255.0;
                color::brightness_contrast(image, alpha, beta)
            }
            Self::GaussNoise { var_min, var_max } => {
                let variance = uniform(rng, var_min, var_max);
                noise::gaussian_noise(image, variance, rng.next_u64())
            }
            Self::Affine {
                translate_fraction,
                rotate_degrees,
            } => {
                let tx = symmetric(rng, translate_fraction) * w as f32;
                let ty = symmetric(rng, translate_fraction) * h as f32;
                let degrees = symmetric(rng, rotate_degrees);
                geometric::affine(image, tx, ty, degrees)
            }
            Self::HueSaturationValue {
                hue_shift_limit,
                sat_shift_limit,
                val_shift_limit,
            } => color::hue_saturation_value(
                image,
                symmetric(rng, hue_shift_limit),
                symmetric(rng, sat_shift_limit),
                symmetric(rng, val_shift_limit),
            ),
            Self::RgbShift {
                r_shift_limit,
                g_shift_limit,
                b_shift_limit,
            } => {
                let shift = [r_shift_limit, g_shift_limit, b_shift_limit].map(|limit| {
                    let limit = limit.saturating_abs();
                    rng.gen_range(-limit..=limit)
                });
                color::rgb_shift(image, shift)
            }
            Self::Clahe {
                clip_limit,
                tile_grid,
            } => color::clahe(image, uniform(rng, 1.0, clip_limit), tile_grid),
            Self::ToGray => color::to_gray(image),
            Self::OpticalDistortion {
                distort_limit,
                shift_limit,
            } => {
                let k = symmetric(rng, distort_limit);
                let dx = symmetric(rng, shift_limit) * w as f32;
                let dy = symmetric(rng, shift_limit) * h as f32;
                distort::optical(image, k, dx, dy)
            }
            Self::GridDistortion {
                num_steps,
                distort_limit,
            } => {
                let mut steps = |n: u32| -> Vec<f32> {
                    (0..=n).map(|_| 1.0 + symmetric(rng, distort_limit)).collect()
                };
                let x_steps = steps(num_steps);
                let y_steps = steps(num_steps);
                distort::grid(image, &x_steps, &y_steps)
            }
            Self::ElasticTransform { alpha, sigma } => {
                let field = distort::ElasticField::random(rng, w, h, alpha, sigma);
                distort::elastic(image, &field)
            }
            Self::CoarseDropout {
                holes,
                min_size,
                max_size,
            } => {
                let holes = occlude::random_holes(rng, w, h, holes, min_size, max_size);
                occlude::coarse_dropout(image, &holes)
            }
            Self::Fog {
                coef_min,
                coef_max,
                alpha_coef,
            } => {
                let coef = uniform(rng, coef_min, coef_max);
                let blobs = occlude::random_fog(rng, w, h, coef, alpha_coef);
                occlude::fog(image, &blobs)
            }
            Self::Shadow { darkness } => {
                let polygon = occlude::random_shadow(rng, w, h);
                occlude::shadow(image, &polygon, darkness)
            }
            Self::SunFlare => match occlude::random_flare(rng, w, h) {
                Some(flare) => occlude::sun_flare(image, &flare),
                None => image.clone(),
            },
            Self::Posterize { bits } => color::posterize(image, bits),
            Self::Equalize => color::equalize(image),
        }
    }
}

/// Draw uniformly from `-limit..=limit`. Non-finite limits yield 0.
fn symmetric<R: Rng + ?Sized>(rng: &mut R, limit: f32) -> f32 {
    let limit = limit.abs();
    if !limit.is_finite() || limit == 0.0 {
        return 0.0;
    }
    rng.gen_range(-limit..=limit)
}

/// Draw uniformly between `a` and `b` in either order.
fn uniform<R: Rng + ?Sized>(rng: &mut R, a: f32, b: f32) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if !(lo.is_finite() && hi.is_finite()) || lo == hi {
        return lo;
    }
    rng.gen_range(lo..=hi)
}

/// An [`Operation`] that fires with a fixed probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub operation: Operation,
    /// Probability in `0.0..=1.0`. Values outside the range are
    /// clamped; NaN never fires.
    pub probability: f64,
}

impl Step {
    #[must_use]
    pub const fn new(operation: Operation, probability: f64) -> Self {
        Self {
            operation,
            probability,
        }
    }

    /// Roll for this step.
    pub fn fires<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        let p = self.probability;
        if p.is_nan() || p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            rng.gen_bool(p)
        }
    }
}

/// A named, ordered list of steps applied together as one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformGroup {
    name: String,
    steps: Vec<Step>,
}

impl TransformGroup {
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run every step in order, each gated by its own probability.
    ///
    /// Always returns a new image, even if no step fired.
    #[must_use = "returns the transformed image"]
    pub fn apply<R: Rng + ?Sized>(&self, image: &RgbImage, rng: &mut R) -> RgbImage {
        let mut current = image.clone();
        for step in &self.steps {
            if step.fires(rng) {
                current = step.operation.apply(&current, rng);
            }
        }
        current
    }
}
