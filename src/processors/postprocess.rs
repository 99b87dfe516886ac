//! Turning raw model outputs into a labelled prediction.

use crate::core::errors::{InferResult, InferenceError, SimpleError};
use crate::domain::{InferenceDetails, InferenceResult, LabelSet};

/// Numerically stable softmax.
///
/// The maximum is subtracted before exponentiation, so the result is unchanged when a
/// constant is added to every logit and large logits do not overflow.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Applies softmax to `logits` and maps the top class to its label.
///
/// Out-of-range indexes are named `class_<index>`.
///
/// # Errors
///
/// Returns a post-processing error when `logits` is empty or contains no finite value.
pub fn postprocess(logits: &[f32], labels: &LabelSet) -> InferResult<InferenceResult> {
    if logits.is_empty() {
        return Err(InferenceError::post_processing(
            "model produced no outputs",
            SimpleError::new("empty logits"),
        ));
    }

    let probs = softmax(logits);
    let index = argmax(&probs)
        .filter(|&i| probs[i].is_finite())
        .ok_or_else(|| {
            InferenceError::post_processing(
                "softmax produced no finite probability",
                SimpleError::new(format!("logits: {logits:?}")),
            )
        })?;

    Ok(InferenceResult {
        label: labels.get(index),
        confidence: probs[index],
        details: InferenceDetails::Probabilities { probs },
    })
}
