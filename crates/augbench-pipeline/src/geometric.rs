//! Geometric transforms: flips, right-angle rotations, transpose,
//! free rotation, and affine warps.
//!
//! Free rotation and affine warps wrap [`imageproc::geometric_transformations`]
//! with bilinear interpolation. Pixels that map outside the source are
//! filled with black.

use image::Rgb;
use imageproc::geometric_transformations::{Interpolation, Projection, rotate_about_center, warp};

use crate::types::RgbImage;

const BORDER: Rgb<u8> = Rgb([0, 0, 0]);

/// Mirror the image left to right.
#[must_use = "returns the flipped image"]
pub fn flip_horizontal(image: &RgbImage) -> RgbImage {
    image::imageops::flip_horizontal(image)
}

/// Mirror the image top to bottom.
#[must_use = "returns the flipped image"]
pub fn flip_vertical(image: &RgbImage) -> RgbImage {
    image::imageops::flip_vertical(image)
}

/// Rotate clockwise by `quarter_turns` × 90°.
///
/// Odd turn counts swap width and height. Only the value modulo 4
/// matters.
#[must_use = "returns the rotated image"]
pub fn rotate_quarter_turns(image: &RgbImage, quarter_turns: u8) -> RgbImage {
    match quarter_turns % 4 {
        1 => image::imageops::rotate90(image),
        2 => image::imageops::rotate180(image),
        3 => image::imageops::rotate270(image),
        _ => image.clone(),
    }
}

/// Swap rows and columns (reflect across the main diagonal).
#[must_use = "returns the transposed image"]
pub fn transpose(image: &RgbImage) -> RgbImage {
    RgbImage::from_fn(image.height(), image.width(), |x, y| *image.get_pixel(y, x))
}

/// Rotate about the image center by `degrees` (positive is clockwise).
///
/// The output keeps the input dimensions; corners that rotate in from
/// outside the source are black.
#[must_use = "returns the rotated image"]
pub fn rotate(image: &RgbImage, degrees: f32) -> RgbImage {
    if degrees == 0.0 {
        return image.clone();
    }
    rotate_about_center(image, degrees.to_radians(), Interpolation::Bilinear, BORDER)
}

/// Rotate about the center by `degrees`, then translate by
/// (`translate_x`, `translate_y`) pixels.
#[must_use = "returns the warped image"]
#[allow(clippy::cast_precision_loss)]
pub fn affine(image: &RgbImage, translate_x: f32, translate_y: f32, degrees: f32) -> RgbImage {
    let cx = image.width() as f32 / 2.0;
    let cy = image.height() as f32 / 2.0;
    let projection = Projection::translate(translate_x, translate_y)
        * Projection::translate(cx, cy)
        * Projection::rotate(degrees.to_radians())
        * Projection::translate(-cx, -cy);
    warp(image, &projection, Interpolation::Bilinear, BORDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x2 image where every pixel is unique.
    fn numbered() -> RgbImage {
        RgbImage::from_fn(4, 2, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let v = (y * 4 + x) as u8;
            Rgb([v, v, v])
        })
    }

    #[test]
    fn flip_horizontal_mirrors_columns() {
        let img = numbered();
        let flipped = flip_horizontal(&img);
        assert_eq!(flipped.get_pixel(0, 0), img.get_pixel(3, 0));
        assert_eq!(flipped.get_pixel(3, 1), img.get_pixel(0, 1));
    }

    #[test]
    fn flip_vertical_mirrors_rows() {
        let img = numbered();
        let flipped = flip_vertical(&img);
        assert_eq!(flipped.get_pixel(2, 0), img.get_pixel(2, 1));
    }

    #[test]
    fn odd_quarter_turns_swap_dimensions() {
        let img = numbered();
        assert_eq!(rotate_quarter_turns(&img, 1).dimensions(), (2, 4));
        assert_eq!(rotate_quarter_turns(&img, 2).dimensions(), (4, 2));
        assert_eq!(rotate_quarter_turns(&img, 3).dimensions(), (2, 4));
        assert_eq!(rotate_quarter_turns(&img, 4), img);
    }

    #[test]
    fn transpose_swaps_axes() {
        let img = numbered();
        let t = transpose(&img);
        assert_eq!(t.dimensions(), (2, 4));
        assert_eq!(t.get_pixel(1, 3), img.get_pixel(3, 1));
        assert_eq!(transpose(&t), img);
    }

    #[test]
    fn zero_rotation_is_identity() {
        let img = numbered();
        assert_eq!(rotate(&img, 0.0), img);
    }

    #[test]
    fn rotation_keeps_dimensions() {
        let img = RgbImage::from_pixel(17, 9, Rgb([200, 100, 50]));
        let rotated = rotate(&img, 20.0);
        assert_eq!(rotated.dimensions(), (17, 9));
        // Corners rotate in from outside the source.
        assert_eq!(rotated.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn pure_translation_shifts_content() {
        let img = RgbImage::from_fn(8, 8, |x, _| if x < 4 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) });
        let shifted = affine(&img, 2.0, 0.0, 0.0);
        assert_eq!(shifted.dimensions(), (8, 8));
        assert_eq!(shifted.get_pixel(0, 4).0, [0, 0, 0]);
        let moved_red = shifted.get_pixel(5, 4).0;
        assert!(moved_red[0] > 200 && moved_red[2] < 50, "got {moved_red:?}");
        let moved_blue = shifted.get_pixel(7, 4).0;
        assert!(moved_blue[2] > 200 && moved_blue[0] < 50, "got {moved_blue:?}");
    }
}
