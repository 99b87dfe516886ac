//! Per-channel image normalization.
//!
//! Each 8-bit channel value `v` becomes `(v * scale - mean) / std`, computed as
//! `v * alpha + beta` with `alpha = scale / std` and `beta = -mean / std`.

use crate::core::config::{ConfigError, NormalizationConfig};
use crate::core::errors::InferResult;
use crate::utils::tensor::Tensor3D;
use image::RgbImage;

/// Normalizes RGB images into channel-first f32 tensors.
#[derive(Debug, Clone)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std)
    pub alpha: [f32; 3],
    /// Offset values for each channel (beta = -mean / std)
    pub beta: [f32; 3],
}

impl NormalizeImage {
    /// Creates a normalizer from scale, per-channel mean and per-channel std.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` if:
    /// * Scale is less than or equal to 0
    /// * Any standard deviation value is less than or equal to 0
    pub fn new(scale: f32, mean: [f32; 3], std: [f32; 3]) -> InferResult<Self> {
        if scale <= 0.0 {
            return Err(ConfigError::InvalidConfig {
                message: format!("Scale must be greater than 0, got {scale}"),
            }
            .into());
        }

        for (i, &s) in std.iter().enumerate() {
            if s <= 0.0 {
                return Err(ConfigError::InvalidConfig {
                    message: format!(
                        "Standard deviation at index {i} must be greater than 0, got {s}"
                    ),
                }
                .into());
            }
        }

        let alpha = std.map(|s| scale / s);
        let beta = [0, 1, 2].map(|c| -mean[c] / std[c]);
        Ok(Self { alpha, beta })
    }

    /// Creates a normalizer from a [`NormalizationConfig`].
    pub fn from_config(config: &NormalizationConfig) -> InferResult<Self> {
        Self::new(config.scale, config.mean, config.std)
    }

    /// ImageNet normalization in RGB order.
    pub fn imagenet() -> Self {
        let NormalizationConfig { scale, mean, std } = NormalizationConfig::IMAGENET_RGB;
        Self {
            alpha: std.map(|s| scale / s),
            beta: [0, 1, 2].map(|c| -mean[c] / std[c]),
        }
    }

    /// Normalizes a single image into a `[3, H, W]` tensor.
    pub fn normalize(&self, img: &RgbImage) -> Tensor3D {
        let (width, height) = img.dimensions();
        Tensor3D::from_shape_fn((3, height as usize, width as usize), |(c, y, x)| {
            let value = img.get_pixel(x as u32, y as u32)[c] as f32;
            value * self.alpha[c] + self.beta[c]
        })
    }
}

impl Default for NormalizeImage {
    fn default() -> Self {
        Self::imagenet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_imagenet_values() {
        let img = RgbImage::from_pixel(2, 2, Rgb([255, 0, 128]));
        let tensor = NormalizeImage::imagenet().normalize(&img);

        assert_eq!(tensor.shape(), &[3, 2, 2]);
        let expected_r = (1.0 - 0.485) / 0.229;
        let expected_g = (0.0 - 0.456) / 0.224;
        let expected_b = (128.0 / 255.0 - 0.406) / 0.225;
        assert!((tensor[[0, 1, 1]] - expected_r).abs() < 1e-5);
        assert!((tensor[[1, 0, 0]] - expected_g).abs() < 1e-5);
        assert!((tensor[[2, 0, 1]] - expected_b).abs() < 1e-5);
    }

    #[test]
    fn test_channel_first_indexing() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([10, 20, 30]));
        let identity = NormalizeImage::new(1.0, [0.0; 3], [1.0; 3]).unwrap();
        let tensor = identity.normalize(&img);

        assert_eq!(tensor.shape(), &[3, 2, 3]);
        assert_eq!(tensor[[0, 1, 2]], 10.0);
        assert_eq!(tensor[[1, 1, 2]], 20.0);
        assert_eq!(tensor[[2, 1, 2]], 30.0);
        assert_eq!(tensor[[0, 0, 0]], 0.0);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(NormalizeImage::new(0.0, [0.0; 3], [1.0; 3]).is_err());
        assert!(NormalizeImage::new(1.0, [0.0; 3], [1.0, 0.0, 1.0]).is_err());
    }
}
