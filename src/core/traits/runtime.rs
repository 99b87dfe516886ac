//! Capability trait implemented by every model runtime adapter.
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌──────────────────┐
//! │  load    │───▶│  input_spec  │───▶│       run        │
//! │ artifact │    │ layout/size  │    │ [1,..] -> logits │
//! └──────────┘    └──────────────┘    └──────────────────┘
//! ```
//!
//! Adapters are selected once, when the model is resolved, and stored as a single boxed
//! instance behind a [`RuntimeHandle`](crate::pipeline::RuntimeHandle).

use crate::core::config::{InputSize, InputSpec, OrtSessionConfig};
use crate::core::errors::InferResult;
use crate::domain::ModelKind;
use crate::utils::tensor::Tensor4D;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Descriptive information about a loaded runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    /// Name of the model, usually the artifact's file stem.
    pub model_name: String,
    /// Kind of artifact the runtime executes.
    pub kind: ModelKind,
    /// Path the model was loaded from.
    pub model_path: PathBuf,
}

/// Options passed to an adapter's `load`.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Size to use for runtimes that must fix their input shape at load time.
    pub input_size: InputSize,
    /// ONNX Runtime session settings.
    pub ort_session: Option<OrtSessionConfig>,
}

/// A loaded model that can execute a single-image forward pass.
pub trait ModelRuntime: Send + Debug {
    /// Loads the artifact at `path`.
    ///
    /// Fails with `RuntimeUnavailable` when the backend for this kind is not available and
    /// `ArtifactLoadFailed` when the artifact itself cannot be loaded.
    fn load(path: &Path, options: &LoadOptions) -> InferResult<Self>
    where
        Self: Sized;

    /// Returns information about this runtime.
    fn info(&self) -> RuntimeInfo;

    /// Reports the layout the model must be fed in and, if declared, its spatial size.
    fn input_spec(&self) -> InputSpec;

    /// Runs a forward pass on a batch of one image laid out per [`Self::input_spec`].
    ///
    /// Returns the output of the single batch item, flattened.
    fn run(&mut self, batch: &Tensor4D) -> InferResult<Vec<f32>>;
}
