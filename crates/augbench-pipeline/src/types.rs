//! Shared types for the augbench augmentation pipeline.

/// Re-export `RgbImage` so downstream crates can hold decoded rasters
/// and augmented variants without depending on `image` directly.
pub use image::RgbImage;

/// Errors that can occur while preparing an image for augmentation.
#[derive(Debug, thiserror::Error)]
pub enum AugmentError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_display() {
        assert_eq!(
            AugmentError::EmptyInput.to_string(),
            "input image data is empty"
        );
    }

    #[test]
    fn image_decode_display_mentions_decode() {
        let err = image::load_from_memory(&[0xFF, 0x00]).map_err(AugmentError::from);
        let Err(err) = err else {
            unreachable!("two bytes never decode as an image");
        };
        assert!(err.to_string().starts_with("failed to decode image"));
    }
}
