//! Utility functions for loading and converting images.

use crate::core::errors::{InferResult, InferenceError};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use std::path::Path;

/// Converts a DynamicImage to an 8-bit RGB image.
pub fn dynamic_to_rgb(img: &DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Converts a DynamicImage to an 8-bit grayscale image with ITU-R 601 luma weights.
///
/// Each pixel becomes `(299 R + 587 G + 114 B) / 1000` in 16-bit fixed point, rounded to
/// nearest. Alpha is dropped first. Unlike `DynamicImage::to_luma8`, which weights
/// channels per BT.709.
pub fn dynamic_to_gray(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000;
        Luma([(luma >> 16) as u8])
    })
}

/// Loads an image from a file path.
///
/// # Errors
///
/// Returns `InferenceError::ImageLoad` if the file cannot be opened or decoded.
pub fn load_image(path: &Path) -> InferResult<DynamicImage> {
    image::open(path).map_err(InferenceError::ImageLoad)
}

/// Decodes an image from an in-memory encoded buffer (PNG, JPEG, ...).
///
/// # Errors
///
/// Returns `InferenceError::ImageLoad` if the format is unknown or the data is corrupt.
pub fn load_image_from_memory(bytes: &[u8]) -> InferResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(InferenceError::ImageLoad)
}

/// Rejects images with a zero dimension.
pub fn ensure_non_empty(img: &DynamicImage) -> InferResult<()> {
    if img.width() == 0 || img.height() == 0 {
        return Err(InferenceError::invalid_input(format!(
            "image has zero size ({}x{})",
            img.width(),
            img.height()
        )));
    }
    Ok(())
}
