//! Deterministic development stand-in for a real model.
//!
//! Only reachable when the operator sets `allow_stub` (`ALLOW_STUB=1`).

use crate::core::constants::{STUB_MAX_CONFIDENCE, STUB_MIN_CONFIDENCE};
use crate::domain::{InferenceDetails, InferenceResult, LabelSet};
use crate::utils::image::dynamic_to_gray;
use image::DynamicImage;

/// Classifies `img` from its mean luminance.
///
/// With `g` the mean ITU-R 601 gray level in `[0, 1]` and `n` labels, the class is
/// `round(g * (n - 1))` with ties to even, and the confidence is `0.75 + 0.2 * (g - 0.5)`
/// clamped to `[0.01, 0.99]`. Arithmetic is done in `f64`.
pub fn classify_stub(img: &DynamicImage, labels: &LabelSet) -> InferenceResult {
    let gray = dynamic_to_gray(img);
    let pixels = gray.as_raw();
    let gray_mean = if pixels.is_empty() {
        0.0
    } else {
        let sum: u64 = pixels.iter().map(|&p| u64::from(p)).sum();
        sum as f64 / pixels.len() as f64 / 255.0
    };

    let last = labels.len().saturating_sub(1);
    let index = ((gray_mean * last as f64).round_ties_even() as usize).min(last);
    let confidence = (0.75 + 0.2 * (gray_mean - 0.5)).clamp(
        f64::from(STUB_MIN_CONFIDENCE),
        f64::from(STUB_MAX_CONFIDENCE),
    ) as f32;

    InferenceResult {
        label: labels.get(index),
        confidence,
        details: InferenceDetails::Stub {
            width: img.width(),
            height: img.height(),
            gray_mean: gray_mean as f32,
        },
    }
}
