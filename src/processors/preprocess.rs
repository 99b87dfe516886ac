//! Image preprocessing: RGB conversion, resize and normalization.

use super::normalization::NormalizeImage;
use crate::core::config::InputSize;
use crate::core::errors::{InferResult, InferenceError};
use crate::utils::image::{dynamic_to_rgb, ensure_non_empty};
use crate::utils::tensor::Tensor3D;
use image::DynamicImage;
use image::imageops::{self, FilterType};
use tracing::debug;

/// Turns an arbitrary image into the `[3, H, W]` tensor a model expects.
///
/// The image is converted to 3-channel RGB (alpha dropped, grayscale replicated), resized to
/// exactly `size` with bilinear filtering regardless of aspect ratio, scaled to `[0, 1]` and
/// normalized with the configured per-channel mean and std.
///
/// # Examples
///
/// ```rust
/// use image::DynamicImage;
/// use mediconnect_ml::core::config::InputSize;
/// use mediconnect_ml::processors::Preprocessor;
///
/// let img = DynamicImage::new_rgba8(640, 480);
/// let tensor = Preprocessor::default().apply(&img, InputSize::new(224, 224)).unwrap();
/// assert_eq!(tensor.shape(), &[3, 224, 224]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    normalize: NormalizeImage,
}

impl Preprocessor {
    /// Creates a preprocessor with a custom normalizer.
    pub fn new(normalize: NormalizeImage) -> Self {
        Self { normalize }
    }

    /// Preprocesses `img` to a `[3, size.height, size.width]` tensor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero-sized image or target size.
    pub fn apply(&self, img: &DynamicImage, size: InputSize) -> InferResult<Tensor3D> {
        ensure_non_empty(img)?;
        if !size.is_valid() {
            return Err(InferenceError::invalid_input(format!(
                "target size {size} must be positive"
            )));
        }

        let rgb = dynamic_to_rgb(img);
        let resized = imageops::resize(&rgb, size.width, size.height, FilterType::Triangle);
        debug!(
            "Preprocessed {}x{} image to {}",
            img.width(),
            img.height(),
            size
        );
        Ok(self.normalize.normalize(&resized))
    }
}

/// Preprocesses `img` with ImageNet normalization.
pub fn preprocess(img: &DynamicImage, size: InputSize) -> InferResult<Tensor3D> {
    Preprocessor::default().apply(img, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    #[test]
    fn test_output_shape_for_any_input_size() {
        for (w, h) in [(1, 1), (640, 480), (31, 257)] {
            let img = DynamicImage::new_rgb8(w, h);
            let tensor = preprocess(&img, InputSize::new(224, 224)).unwrap();
            assert_eq!(tensor.shape(), &[3, 224, 224]);
        }

        let img = DynamicImage::new_rgb8(50, 50);
        let tensor = preprocess(&img, InputSize::new(64, 96)).unwrap();
        assert_eq!(tensor.shape(), &[3, 64, 96]);
    }

    #[test]
    fn test_grayscale_is_replicated() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([255])));
        let tensor = preprocess(&img, InputSize::new(4, 4)).unwrap();
        let expected = [
            (1.0 - 0.485) / 0.229,
            (1.0 - 0.456) / 0.224,
            (1.0 - 0.406) / 0.225,
        ];
        for (c, want) in expected.iter().enumerate() {
            assert!((tensor[[c, 2, 2]] - want).abs() < 1e-4);
        }
    }

    #[test]
    fn test_alpha_is_dropped() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])));
        let tensor = preprocess(&img, InputSize::new(2, 2)).unwrap();
        assert_eq!(tensor.shape(), &[3, 2, 2]);
        assert!((tensor[[0, 0, 0]] - (-0.485 / 0.229)).abs() < 1e-5);
    }

    #[test]
    fn test_zero_sized_image_is_rejected() {
        let img = DynamicImage::new_rgb8(0, 0);
        assert!(matches!(
            preprocess(&img, InputSize::default()),
            Err(InferenceError::InvalidInput { .. })
        ));
    }
}
