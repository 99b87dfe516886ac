//! Tensor aliases and layout helpers.
//!
//! The preprocessor always produces a channel-first `[3, H, W]` tensor. Adapters receive
//! a batch of one in whichever layout their model declared, built here.

use crate::core::config::InputLayout;
use crate::core::errors::{InferResult, InferenceError, SimpleError};
use ndarray::{Array3, Array4, ArrayView4, Axis};

/// A 3-dimensional tensor of f32 values (channels, height, width).
pub type Tensor3D = Array3<f32>;

/// A 4-dimensional tensor of f32 values (batch plus three image axes).
pub type Tensor4D = Array4<f32>;

/// Adds the batch axis to a `[C, H, W]` tensor and reorders it to `layout`.
///
/// The result is always in standard (row-major, contiguous) layout so it can be handed
/// to runtimes that read the raw buffer.
pub fn to_batched_layout(chw: &Tensor3D, layout: InputLayout) -> Tensor4D {
    let batched = chw.view().insert_axis(Axis(0));
    match layout {
        InputLayout::ChannelFirst => batched.as_standard_layout().into_owned(),
        InputLayout::ChannelLast => batched
            .permuted_axes([0, 2, 3, 1])
            .as_standard_layout()
            .into_owned(),
    }
}

/// Returns the contiguous data of a standard-layout tensor.
pub fn contiguous_data<'a>(tensor: &'a ArrayView4<'_, f32>) -> InferResult<&'a [f32]> {
    tensor.as_slice().ok_or_else(|| {
        InferenceError::tensor_operation(
            format!("reading input tensor with shape {:?}", tensor.shape()),
            SimpleError::new("tensor is not in standard layout"),
        )
    })
}

/// Flattens the first batch item of a runtime output.
///
/// `shape` is the output shape as reported by the runtime and `data` its row-major buffer.
/// A scalar or 1-D output is treated as already unbatched.
pub fn first_batch_item(shape: &[usize], data: &[f32]) -> InferResult<Vec<f32>> {
    if shape.len() <= 1 {
        return Ok(data.to_vec());
    }

    let item_len: usize = shape[1..].iter().product();
    if shape[0] == 0 || data.len() < item_len {
        return Err(InferenceError::tensor_operation(
            format!("reading model output with shape {shape:?}"),
            SimpleError::new(format!("no batch item in {} values", data.len())),
        ));
    }
    Ok(data[..item_len].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ProcessingStage;

    fn sample_chw() -> Tensor3D {
        // value encodes (c, y, x) as c*100 + y*10 + x
        Array3::from_shape_fn((3, 2, 4), |(c, y, x)| (c * 100 + y * 10 + x) as f32)
    }

    #[test]
    fn test_channel_first_batch() {
        let batch = to_batched_layout(&sample_chw(), InputLayout::ChannelFirst);
        assert_eq!(batch.shape(), &[1, 3, 2, 4]);
        assert_eq!(batch[[0, 2, 1, 3]], 213.0);
        assert!(batch.is_standard_layout());
    }

    #[test]
    fn test_channel_last_batch() {
        let batch = to_batched_layout(&sample_chw(), InputLayout::ChannelLast);
        assert_eq!(batch.shape(), &[1, 2, 4, 3]);
        assert_eq!(batch[[0, 1, 3, 2]], 213.0);
        assert!(batch.is_standard_layout());

        let view = batch.view();
        let data = contiguous_data(&view).unwrap();
        // first pixel, all three channels
        assert_eq!(&data[..3], &[0.0, 100.0, 200.0]);
    }

    #[test]
    fn test_first_batch_item_strips_batch() {
        let data = [0.1, 0.7, 0.2];
        assert_eq!(first_batch_item(&[1, 3], &data).unwrap(), vec![0.1, 0.7, 0.2]);
        assert_eq!(first_batch_item(&[3], &data).unwrap(), vec![0.1, 0.7, 0.2]);

        let two = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(first_batch_item(&[2, 2], &two).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_first_batch_item_rejects_empty_batch() {
        let err = first_batch_item(&[0, 3], &[]).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::Processing {
                kind: ProcessingStage::TensorOperation,
                ..
            }
        ));
    }

    #[test]
    fn test_contiguous_data_rejects_strided_view() {
        let batch = Tensor4D::zeros((1, 3, 2, 4));
        let permuted = batch.view().permuted_axes([0, 2, 3, 1]);
        let err = contiguous_data(&permuted).unwrap_err();
        assert!(err.to_string().starts_with("tensor operation failed"));
    }
}
