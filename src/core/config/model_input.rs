//! Model input configuration: spatial size, tensor layout and normalization.
//!
//! Graph-execution models declare their first input as a shape where positive values are
//! fixed and non-positive values (`-1`, `0`) are dynamic:
//!
//! - `[1, 3, 224, 224]` - channel-first, fixed 224x224
//! - `[1, 224, 224, 3]` - channel-last, fixed 224x224
//! - `[-1, 3, -1, -1]` - channel-first, dynamic spatial size
//!
//! [`InputSpec::from_declared_shape`] turns such a shape into a layout plus an optional
//! discovered size, and [`negotiate_input_size`] applies the precedence
//! override > discovered > default.

use super::ConfigError;
use crate::core::constants::{
    DEFAULT_INPUT_SIZE, DEFAULT_NORMALIZATION_SCALE, IMAGENET_MEAN, IMAGENET_STD,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Represents a dimension that can be fixed or dynamic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    /// Fixed dimension with a specific value
    Fixed(i64),
    /// Dynamic dimension (declared as -1 or 0)
    Dynamic,
}

impl Dim {
    /// Returns the fixed value if this dimension is fixed, None otherwise.
    pub fn value(&self) -> Option<i64> {
        match self {
            Dim::Fixed(v) => Some(*v),
            Dim::Dynamic => None,
        }
    }

    /// Returns the value as a pixel count when it is fixed and fits in `u32`.
    fn pixels(&self) -> Option<u32> {
        self.value().and_then(|v| u32::try_from(v).ok())
    }
}

impl From<i64> for Dim {
    fn from(value: i64) -> Self {
        if value <= 0 {
            Dim::Dynamic
        } else {
            Dim::Fixed(value)
        }
    }
}

impl std::fmt::Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dim::Fixed(v) => write!(f, "{}", v),
            Dim::Dynamic => write!(f, "-1"),
        }
    }
}

/// Spatial input size of a model, as (height, width) in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputSize {
    /// Height in pixels
    pub height: u32,
    /// Width in pixels
    pub width: u32,
}

impl InputSize {
    /// Creates a new input size.
    pub const fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    /// Returns true when both dimensions are positive.
    pub fn is_valid(&self) -> bool {
        self.height > 0 && self.width > 0
    }

    /// Returns the size as a (height, width) tuple.
    pub fn as_tuple(&self) -> (u32, u32) {
        (self.height, self.width)
    }
}

impl Default for InputSize {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE.0, DEFAULT_INPUT_SIZE.1)
    }
}

impl From<(u32, u32)> for InputSize {
    fn from((height, width): (u32, u32)) -> Self {
        Self::new(height, width)
    }
}

impl std::fmt::Display for InputSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Parses `"height,width"`; both values must be positive integers.
impl FromStr for InputSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidInputSize {
            value: s.to_string(),
        };
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [height, width] = parts.as_slice() else {
            return Err(invalid());
        };
        let height: u32 = height.parse().map_err(|_| invalid())?;
        let width: u32 = width.parse().map_err(|_| invalid())?;
        let size = Self::new(height, width);
        if size.is_valid() { Ok(size) } else { Err(invalid()) }
    }
}

/// Axis ordering of the image tensor fed to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputLayout {
    /// `[batch, channels, height, width]` (PyTorch convention)
    ChannelFirst,
    /// `[batch, height, width, channels]` (TensorFlow convention)
    ChannelLast,
}

impl std::fmt::Display for InputLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputLayout::ChannelFirst => write!(f, "NCHW"),
            InputLayout::ChannelLast => write!(f, "NHWC"),
        }
    }
}

/// What a loaded model reports about its expected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
    /// The layout the model must be fed in.
    pub layout: InputLayout,
    /// Spatial size declared by the model, if it declares a fixed one.
    pub size: Option<InputSize>,
}

impl InputSpec {
    /// A fixed layout with no discovered size.
    pub const fn fixed(layout: InputLayout) -> Self {
        Self { layout, size: None }
    }

    /// Interprets the first declared input shape of a graph-execution model.
    ///
    /// A rank-4 shape with 3 in position 1 is channel-first with spatial dims 2 and 3; one
    /// with 3 in position 3 is channel-last with spatial dims 1 and 2. Any other shape is fed
    /// channel-last and yields no size. Dynamic spatial dims never become a size.
    pub fn from_declared_shape(dims: &[i64]) -> Self {
        let dims: Vec<Dim> = dims.iter().copied().map(Dim::from).collect();
        match dims.as_slice() {
            [_, Dim::Fixed(3), height, width] => Self {
                layout: InputLayout::ChannelFirst,
                size: spatial_size(height, width),
            },
            [_, height, width, Dim::Fixed(3)] => Self {
                layout: InputLayout::ChannelLast,
                size: spatial_size(height, width),
            },
            _ => Self::fixed(InputLayout::ChannelLast),
        }
    }
}

fn spatial_size(height: &Dim, width: &Dim) -> Option<InputSize> {
    Some(InputSize::new(height.pixels()?, width.pixels()?))
}

/// Resolves the size a model is actually fed: override > discovered > default.
pub fn negotiate_input_size(
    override_size: Option<InputSize>,
    discovered: Option<InputSize>,
) -> InputSize {
    override_size
        .filter(InputSize::is_valid)
        .or(discovered.filter(InputSize::is_valid))
        .unwrap_or_default()
}

/// Normalization parameters for image preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationConfig {
    /// Scale factor applied before normalization (e.g., 1/255)
    pub scale: f32,
    /// Mean values per channel (RGB order)
    pub mean: [f32; 3],
    /// Standard deviation values per channel (RGB order)
    pub std: [f32; 3],
}

impl NormalizationConfig {
    /// ImageNet normalization in RGB order.
    pub const IMAGENET_RGB: Self = Self {
        scale: DEFAULT_NORMALIZATION_SCALE,
        mean: IMAGENET_MEAN,
        std: IMAGENET_STD,
    };
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self::IMAGENET_RGB
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dim_from_i64() {
        assert_eq!(Dim::from(512), Dim::Fixed(512));
        assert_eq!(Dim::from(-1), Dim::Dynamic);
        assert_eq!(Dim::from(0), Dim::Dynamic);
    }

    #[test]
    fn test_channel_first_shape_is_discovered() {
        let spec = InputSpec::from_declared_shape(&[1, 3, 64, 64]);
        assert_eq!(spec.layout, InputLayout::ChannelFirst);
        assert_eq!(spec.size, Some(InputSize::new(64, 64)));
    }

    #[test]
    fn test_channel_last_shape_is_discovered() {
        let spec = InputSpec::from_declared_shape(&[1, 299, 320, 3]);
        assert_eq!(spec.layout, InputLayout::ChannelLast);
        assert_eq!(spec.size, Some(InputSize::new(299, 320)));
    }

    #[test]
    fn test_dynamic_spatial_keeps_layout_without_size() {
        let spec = InputSpec::from_declared_shape(&[-1, 3, -1, -1]);
        assert_eq!(spec.layout, InputLayout::ChannelFirst);
        assert_eq!(spec.size, None);
    }

    #[test]
    fn test_unrecognized_shape_falls_back_to_channel_last() {
        assert_eq!(
            InputSpec::from_declared_shape(&[1, 1, 28, 28]),
            InputSpec::fixed(InputLayout::ChannelLast)
        );
        assert_eq!(
            InputSpec::from_declared_shape(&[1, 784]),
            InputSpec::fixed(InputLayout::ChannelLast)
        );
    }

    #[test]
    fn test_negotiation_precedence() {
        let override_size = Some(InputSize::new(128, 96));
        let discovered = Some(InputSize::new(64, 64));

        assert_eq!(
            negotiate_input_size(override_size, discovered),
            InputSize::new(128, 96)
        );
        assert_eq!(negotiate_input_size(None, discovered), InputSize::new(64, 64));
        assert_eq!(negotiate_input_size(None, None), InputSize::new(224, 224));
    }

    #[test]
    fn test_discovered_size_overrides_default() {
        let spec = InputSpec::from_declared_shape(&[1, 3, 64, 64]);
        assert_eq!(negotiate_input_size(None, spec.size), InputSize::new(64, 64));
    }

    #[test]
    fn test_input_size_from_str() {
        assert_eq!("224,224".parse::<InputSize>().ok(), Some(InputSize::new(224, 224)));
        assert_eq!(" 320 , 240 ".parse::<InputSize>().ok(), Some(InputSize::new(320, 240)));
        assert!("0,224".parse::<InputSize>().is_err());
        assert!("-1,224".parse::<InputSize>().is_err());
        assert!("224".parse::<InputSize>().is_err());
        assert!("224,224,3".parse::<InputSize>().is_err());
        assert!("abc,def".parse::<InputSize>().is_err());
    }

    #[test]
    fn test_normalization_defaults_to_imagenet() {
        let config = NormalizationConfig::default();
        assert_eq!(config.mean, [0.485, 0.456, 0.406]);
        assert_eq!(config.std, [0.229, 0.224, 0.225]);
    }
}
