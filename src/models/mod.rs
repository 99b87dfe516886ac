//! Runtime adapters for classification models.
//!
//! Each adapter implements [`ModelRuntime`] for one model family and is compiled behind a
//! cargo feature. With the feature off, loading that family fails with `RuntimeUnavailable`.
//!
//! | Kind | Adapter | Feature |
//! |------|---------|---------|
//! | graph-execution (`.onnx`) | [`OnnxRuntime`] | `onnx` (default) |
//! | traced-script (`.pt`, `.pth`) | [`TorchScriptRuntime`] | `torch` |
//! | frozen-graph (`.pb`, directory of `.pb`) | [`FrozenGraphRuntime`] | `tensorflow` |
//! | frozen-graph (SavedModel directory) | [`SavedModelRuntime`] | `tensorflow` |

pub mod frozen_graph;
pub mod onnx;
pub mod saved_model;
pub mod torchscript;

pub use frozen_graph::FrozenGraphRuntime;
pub use onnx::OnnxRuntime;
pub use saved_model::{SavedModelRuntime, is_saved_model};
pub use torchscript::TorchScriptRuntime;

use crate::core::errors::{InferResult, InferenceError};
use crate::core::traits::{LoadOptions, ModelRuntime};
use crate::domain::{ModelArtifact, ModelKind};

fn boxed<R: ModelRuntime + 'static>(
    artifact: &ModelArtifact,
    options: &LoadOptions,
) -> InferResult<Box<dyn ModelRuntime>> {
    Ok(Box::new(R::load(&artifact.path, options)?))
}

/// Loads `artifact` with the adapter for its kind.
///
/// A frozen-graph directory holding `saved_model.pb` goes to [`SavedModelRuntime`]; other
/// frozen-graph artifacts go to [`FrozenGraphRuntime`].
///
/// # Errors
///
/// * `UnsupportedArtifact` for `ModelKind::Unknown`
/// * `RuntimeUnavailable` when the adapter's feature is disabled or the format has no runtime
/// * `ArtifactLoadFailed` when the runtime rejects the artifact
pub fn load_runtime(
    artifact: &ModelArtifact,
    options: &LoadOptions,
) -> InferResult<Box<dyn ModelRuntime>> {
    match artifact.kind {
        ModelKind::GraphExecution => boxed::<OnnxRuntime>(artifact, options),
        ModelKind::TracedScript => boxed::<TorchScriptRuntime>(artifact, options),
        ModelKind::FrozenGraph if is_saved_model(&artifact.path) => {
            boxed::<SavedModelRuntime>(artifact, options)
        }
        ModelKind::FrozenGraph => boxed::<FrozenGraphRuntime>(artifact, options),
        ModelKind::Unknown => Err(InferenceError::UnsupportedArtifact {
            path: artifact.path.clone(),
        }),
    }
}
