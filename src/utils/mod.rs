//! Utility functions for the classification pipeline.
//!
//! This module provides image loading helpers and tensor layout conversions.

pub mod image;
pub mod tensor;

pub use self::image::{
    dynamic_to_gray, dynamic_to_rgb, ensure_non_empty, load_image, load_image_from_memory,
};
pub use tensor::{Tensor3D, Tensor4D, first_batch_item, to_batched_layout};
