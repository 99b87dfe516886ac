//! Image and output processing for classification models.
//!
//! # Modules
//!
//! * `normalization` - Per-channel mean/std normalization into channel-first tensors
//! * `preprocess` - RGB conversion and resizing ahead of normalization
//! * `postprocess` - Softmax, argmax and label mapping

mod normalization;
mod postprocess;
mod preprocess;

pub use normalization::NormalizeImage;
pub use postprocess::{argmax, postprocess, softmax};
pub use preprocess::{Preprocessor, preprocess};
