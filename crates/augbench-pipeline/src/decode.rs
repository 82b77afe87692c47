//! Image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces an 8-bit
//! RGB raster. Alpha is discarded; grayscale sources are expanded to
//! three identical channels so every transform sees the same layout.

use crate::types::{AugmentError, RgbImage};

/// Decode raw image bytes into an RGB raster.
///
/// # Errors
///
/// Returns [`AugmentError::EmptyInput`] if `bytes` is empty.
/// Returns [`AugmentError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, AugmentError> {
    if bytes.is_empty() {
        return Err(AugmentError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        let result = decode(&[]);
        assert!(matches!(result, Err(AugmentError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(AugmentError::ImageDecode(_))));
    }

    #[test]
    fn rgba_png_drops_alpha() {
        let img = image::RgbaImage::from_fn(3, 2, |_, _| image::Rgba([10, 20, 30, 0]));
        let rgb = decode(&encode_png(&img)).unwrap();
        assert_eq!(rgb.dimensions(), (3, 2));
        for pixel in rgb.pixels() {
            assert_eq!(pixel.0, [10, 20, 30]);
        }
    }
}
