//! The outcome of classifying one image.

use serde::Serialize;

/// Top-1 classification of a single image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceResult {
    /// Predicted class name.
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Path-specific details.
    pub details: InferenceDetails,
}

/// Extra information attached to an [`InferenceResult`].
///
/// Serialized untagged, so a model result reads `{"probs": [...]}` and a stub result
/// reads `{"width": .., "height": .., "grayMean": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InferenceDetails {
    /// Full probability vector produced by a loaded model.
    Probabilities {
        /// Softmax output, one entry per class index.
        probs: Vec<f32>,
    },
    /// Image statistics used by the development stub.
    Stub {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Mean luminance in `[0, 1]`.
        #[serde(rename = "grayMean")]
        gray_mean: f32,
    },
}

impl InferenceDetails {
    /// Returns the probability vector for model results.
    pub fn probabilities(&self) -> Option<&[f32]> {
        match self {
            InferenceDetails::Probabilities { probs } => Some(probs),
            InferenceDetails::Stub { .. } => None,
        }
    }

    /// Returns true for results synthesized by the stub.
    pub fn is_stub(&self) -> bool {
        matches!(self, InferenceDetails::Stub { .. })
    }
}
