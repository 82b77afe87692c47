//! augbench-pipeline: Pure image augmentation fan-out (sans-IO).
//!
//! Decodes one source image and expands it into a family of variants
//! by running an ordered list of transform groups, where each group is
//! applied to every image produced so far:
//!
//! flip/channel-shuffle -> rotate/brightness -> noise -> brightness ->
//! geometric -> color jitter -> distortion -> occlusion/weather.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and rasters. Filesystem access and the worker pool live
//! in `augbench`.

pub mod color;
pub mod decode;
pub mod distort;
pub mod geometric;
pub mod noise;
pub mod occlude;
pub mod stages;
pub mod transform;
pub mod types;

use rand::Rng;

pub use stages::StagePipeline;
pub use transform::{Operation, Step, TransformGroup};
pub use types::{AugmentError, RgbImage};

/// Decode `image_bytes` and run the full stage pipeline on it.
///
/// Returns `2^pipeline.len()` images in production order; index 0 is
/// the decoded original.
///
/// # Errors
///
/// Returns [`AugmentError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`AugmentError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn augment<R: Rng + ?Sized>(
    image_bytes: &[u8],
    pipeline: &StagePipeline,
    rng: &mut R,
) -> Result<Vec<RgbImage>, AugmentError> {
    let original = decode::decode(image_bytes)?;
    Ok(pipeline.augment(original, rng))
}
