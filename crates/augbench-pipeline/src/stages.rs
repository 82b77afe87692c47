//! The stage pipeline and its exponential fan-out.
//!
//! A [`StagePipeline`] is an ordered list of [`TransformGroup`]s. Running
//! it on one image starts a family containing only the original; each
//! stage then transforms *every* member of the family and appends the
//! results. With `k` stages the family ends with exactly `2^k` members,
//! in production order, with the untouched original at index 0.
//!
//! Later stages see the output of earlier ones, so effects compound.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transform::{Operation, Step, TransformGroup};
use crate::types::RgbImage;

/// Maximum rotation for the rotate and affine steps, in degrees.
pub const ROTATE_LIMIT_DEGREES: f32 = 20.0;
/// Brightness and contrast limits for every brightness/contrast step.
pub const BRIGHTNESS_CONTRAST_LIMIT: f32 = 0.2;
/// Gaussian noise variance range, in squared sample units.
pub const NOISE_VARIANCE: (f32, f32) = (10.0, 40.0);
/// Affine translation as a fraction of each dimension.
pub const AFFINE_TRANSLATE_FRACTION: f32 = 0.1;
/// Per-channel RGB shift limit.
pub const RGB_SHIFT_LIMIT: i16 = 15;
/// Coarse dropout hole side range in pixels.
pub const DROPOUT_HOLE_SIZE: (u32, u32) = (8, 16);
/// Coarse dropout hole count.
pub const DROPOUT_HOLES: u32 = 8;
/// Bits kept by the posterize step.
pub const POSTERIZE_BITS: u8 = 4;

/// An ordered sequence of transform groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagePipeline {
    groups: Vec<TransformGroup>,
}

impl Default for StagePipeline {
    fn default() -> Self {
        Self::new(default_groups())
    }
}

impl StagePipeline {
    #[must_use]
    pub const fn new(groups: Vec<TransformGroup>) -> Self {
        Self { groups }
    }

    #[must_use]
    pub fn groups(&self) -> &[TransformGroup] {
        &self.groups
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Keep only the first `stages` groups.
    #[must_use]
    pub fn truncated(mut self, stages: usize) -> Self {
        self.groups.truncate(stages);
        self
    }

    /// Number of images [`augment`](Self::augment) produces per input,
    /// `2^len()`. `None` if that does not fit in `usize`.
    #[must_use]
    pub fn variant_count(&self) -> Option<usize> {
        u32::try_from(self.groups.len())
            .ok()
            .and_then(|k| 1usize.checked_shl(k))
    }

    /// Run every stage over the growing family of images.
    ///
    /// Returns the full family in production order; index 0 is
    /// `original`.
    #[must_use = "returns the augmented family"]
    pub fn augment<R: Rng + ?Sized>(&self, original: RgbImage, rng: &mut R) -> Vec<RgbImage> {
        let mut family = Vec::with_capacity(self.variant_count().unwrap_or(0));
        family.push(original);
        for group in &self.groups {
            let current = family.len();
            for i in 0..current {
                let augmented = group.apply(&family[i], rng);
                family.push(augmented);
            }
            debug!(stage = group.name(), family = family.len(), "stage applied");
        }
        family
    }
}

/// The eight groups of the default schedule.
#[must_use]
pub fn default_groups() -> Vec<TransformGroup> {
    let brightness_contrast = Operation::BrightnessContrast {
        brightness_limit: BRIGHTNESS_CONTRAST_LIMIT,
        contrast_limit: BRIGHTNESS_CONTRAST_LIMIT,
    };
    vec![
        TransformGroup::new(
            "flip-channel-shuffle",
            vec![
                Step::new(Operation::HorizontalFlip, 0.5),
                Step::new(Operation::ChannelShuffle, 0.5),
            ],
        ),
        TransformGroup::new(
            "rotate-brightness-contrast",
            vec![
                Step::new(
                    Operation::Rotate {
                        limit_degrees: ROTATE_LIMIT_DEGREES,
                    },
                    1.0,
                ),
                Step::new(brightness_contrast.clone(), 0.5),
            ],
        ),
        TransformGroup::new(
            "gauss-noise",
            vec![Step::new(
                Operation::GaussNoise {
                    var_min: NOISE_VARIANCE.0,
                    var_max: NOISE_VARIANCE.1,
                },
                0.5,
            )],
        ),
        TransformGroup::new(
            "brightness-contrast",
            vec![Step::new(brightness_contrast.clone(), 0.5)],
        ),
        TransformGroup::new(
            "geometric",
            vec![
                Step::new(Operation::HorizontalFlip, 0.5),
                Step::new(Operation::VerticalFlip, 0.5),
                Step::new(Operation::RandomRotate90, 0.5),
                Step::new(Operation::Transpose, 0.5),
                Step::new(
                    Operation::Affine {
                        translate_fraction: AFFINE_TRANSLATE_FRACTION,
                        rotate_degrees: ROTATE_LIMIT_DEGREES,
                    },
                    0.7,
                ),
            ],
        ),
        TransformGroup::new(
            "color-jitter",
            vec![
                Step::new(brightness_contrast, 0.5),
                Step::new(
                    Operation::HueSaturationValue {
                        hue_shift_limit: 20.0,
                        sat_shift_limit: 30.0,
                        val_shift_limit: 20.0,
                    },
                    0.5,
                ),
                Step::new(
                    Operation::RgbShift {
                        r_shift_limit: RGB_SHIFT_LIMIT,
                        g_shift_limit: RGB_SHIFT_LIMIT,
                        b_shift_limit: RGB_SHIFT_LIMIT,
                    },
                    0.5,
                ),
                Step::new(
                    Operation::Clahe {
                        clip_limit: 4.0,
                        tile_grid: 8,
                    },
                    0.3,
                ),
                Step::new(Operation::ToGray, 0.3),
            ],
        ),
        TransformGroup::new(
            "distortion",
            vec![
                Step::new(
                    Operation::OpticalDistortion {
                        distort_limit: 1.0,
                        shift_limit: 0.05,
                    },
                    0.5,
                ),
                Step::new(
                    Operation::GridDistortion {
                        num_steps: 5,
                        distort_limit: 0.3,
                    },
                    0.5,
                ),
                Step::new(
                    Operation::ElasticTransform {
                        alpha: 1.0,
                        sigma: 50.0,
                    },
                    0.5,
                ),
            ],
        ),
        TransformGroup::new(
            "occlusion-weather",
            vec![
                Step::new(
                    Operation::CoarseDropout {
                        holes: DROPOUT_HOLES,
                        min_size: DROPOUT_HOLE_SIZE.0,
                        max_size: DROPOUT_HOLE_SIZE.1,
                    },
                    0.5,
                ),
                Step::new(
                    Operation::Fog {
                        coef_min: 0.1,
                        coef_max: 0.3,
                        alpha_coef: 0.08,
                    },
                    0.4,
                ),
                Step::new(Operation::Shadow { darkness: 0.5 }, 0.4),
                Step::new(Operation::SunFlare, 0.3),
                Step::new(
                    Operation::Posterize {
                        bits: POSTERIZE_BITS,
                    },
                    0.3,
                ),
                Step::new(Operation::Equalize, 0.3),
            ],
        ),
    ]
}
