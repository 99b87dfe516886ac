//! Error types for the classification pipeline.
//!
//! Load-time failures (`RuntimeUnavailable`, `ArtifactLoadFailed`, `UnsupportedArtifact`)
//! are produced while resolving a model and are swallowed by the resolver, which degrades
//! to the unloaded state. Inference-time failures (`ModelUnavailable`, `InferenceFailed`)
//! are surfaced to the caller of [`Classifier::classify`](crate::pipeline::Classifier::classify).
//!
//! # Usage
//!
//! ```rust
//! use mediconnect_ml::core::errors::{InferenceError, ProcessingStage};
//! use mediconnect_ml::domain::ModelKind;
//!
//! let unavailable = InferenceError::runtime_unavailable(
//!     ModelKind::TracedScript,
//!     "libtorch",
//!     "rebuild with the `torch` feature",
//! );
//! assert!(unavailable.is_load_failure());
//!
//! let failed = InferenceError::inference_failed(
//!     "model",
//!     "forward pass",
//!     std::io::Error::other("device lost"),
//! );
//! assert!(!failed.is_load_failure());
//! ```

use crate::core::config::ConfigError;
use crate::domain::ModelKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Boxed error used as the source of wrapped failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Convenient result alias for pipeline operations.
pub type InferResult<T> = Result<T, InferenceError>;

/// Stage of the per-call pipeline where a processing error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Reading an input or output tensor buffer.
    TensorOperation,
    /// Softmax and label mapping.
    PostProcessing,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
        }
    }
}

/// Errors raised while resolving, loading or running a classification model.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The backend needed for this model kind is not compiled in or cannot run the format.
    #[error("{runtime} runtime unavailable for {kind} model: {hint}")]
    RuntimeUnavailable {
        /// The kind of artifact that was found.
        kind: ModelKind,
        /// Name of the missing runtime.
        runtime: &'static str,
        /// What the operator can do about it.
        hint: String,
    },

    /// A located artifact matched a known kind but failed to parse or load.
    #[error("failed to load model '{}': {context}", path.display())]
    ArtifactLoadFailed {
        /// Path of the artifact.
        path: PathBuf,
        /// What was being attempted.
        context: String,
        /// The underlying runtime error.
        #[source]
        source: BoxError,
    },

    /// The artifact's extension or structure does not match any known model kind.
    #[error("unsupported model artifact '{}'", path.display())]
    UnsupportedArtifact {
        /// Path of the artifact.
        path: PathBuf,
    },

    /// No model is loaded and the development stub is disabled.
    #[error(
        "ML model not loaded: place a model in '{}' (e.g. model.onnx or model.pt) with an optional labels.txt, or set MODEL_PATH; for development only, set ALLOW_STUB=1",
        search_dir.display()
    )]
    ModelUnavailable {
        /// Directory that was searched at startup.
        search_dir: PathBuf,
    },

    /// A loaded model raised during execution.
    #[error("model inference failed for '{model_name}': {context}")]
    InferenceFailed {
        /// Name of the model that failed.
        model_name: String,
        /// What was being attempted.
        context: String,
        /// The underlying runtime error.
        #[source]
        source: BoxError,
    },

    /// A preprocessing or postprocessing step failed.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error.
        #[source]
        source: BoxError,
    },

    /// The caller supplied input the pipeline cannot process.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Invalid pipeline configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The image could not be decoded.
    #[error("image load")]
    ImageLoad(#[from] image::ImageError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl InferenceError {
    /// Creates a `RuntimeUnavailable` error.
    pub fn runtime_unavailable(
        kind: ModelKind,
        runtime: &'static str,
        hint: impl Into<String>,
    ) -> Self {
        Self::RuntimeUnavailable {
            kind,
            runtime,
            hint: hint.into(),
        }
    }

    /// Creates an `ArtifactLoadFailed` error for the artifact at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - The artifact that failed to load.
    /// * `context` - What was being attempted.
    /// * `error` - The underlying error.
    pub fn artifact_load_failed(
        path: impl AsRef<Path>,
        context: impl Into<String>,
        error: impl Into<BoxError>,
    ) -> Self {
        Self::ArtifactLoadFailed {
            path: path.as_ref().to_path_buf(),
            context: context.into(),
            source: error.into(),
        }
    }

    /// Creates an `InferenceFailed` error.
    ///
    /// # Arguments
    ///
    /// * `model_name` - The model that failed.
    /// * `context` - What was being attempted.
    /// * `error` - The underlying error.
    pub fn inference_failed(
        model_name: impl Into<String>,
        context: impl Into<String>,
        error: impl Into<BoxError>,
    ) -> Self {
        Self::InferenceFailed {
            model_name: model_name.into(),
            context: context.into(),
            source: error.into(),
        }
    }

    /// Creates a processing error for the given stage.
    pub fn processing(
        kind: ProcessingStage,
        context: impl Into<String>,
        error: impl Into<BoxError>,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: error.into(),
        }
    }

    /// Creates a post-processing error.
    pub fn post_processing(context: impl Into<String>, error: impl Into<BoxError>) -> Self {
        Self::processing(ProcessingStage::PostProcessing, context, error)
    }

    /// Creates a tensor operation error.
    pub fn tensor_operation(context: impl Into<String>, error: impl Into<BoxError>) -> Self {
        Self::processing(ProcessingStage::TensorOperation, context, error)
    }

    /// Creates an `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Returns true for the failures that can only happen while loading a model.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::RuntimeUnavailable { .. }
                | Self::ArtifactLoadFailed { .. }
                | Self::UnsupportedArtifact { .. }
        )
    }
}

/// A plain message error, for wrapping failures that carry no error value of their own.
#[derive(Debug)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SimpleError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_load_failures_are_classified() {
        let unsupported = InferenceError::UnsupportedArtifact {
            path: PathBuf::from("models/labels.txt"),
        };
        let load = InferenceError::artifact_load_failed(
            "models/model.onnx",
            "failed to create ONNX session",
            SimpleError::new("bad protobuf"),
        );
        let unavailable = InferenceError::ModelUnavailable {
            search_dir: PathBuf::from("models"),
        };

        assert!(unsupported.is_load_failure());
        assert!(load.is_load_failure());
        assert!(!unavailable.is_load_failure());
    }

    #[test]
    fn test_inference_failed_keeps_cause() {
        let err = InferenceError::inference_failed(
            "resnet",
            "forward pass",
            SimpleError::new("shape mismatch"),
        );

        assert!(err.to_string().contains("resnet"));
        let source = err.source().expect("cause should be attached");
        assert_eq!(source.to_string(), "shape mismatch");
    }

    #[test]
    fn test_string_sources_are_accepted() {
        let err = InferenceError::artifact_load_failed("graph.pb", "parse", "truncated file");
        assert!(err.to_string().contains("graph.pb"));
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("truncated file".to_string())
        );
    }

    #[test]
    fn test_model_unavailable_is_actionable() {
        let err = InferenceError::ModelUnavailable {
            search_dir: PathBuf::from("/srv/models"),
        };
        let message = err.to_string();
        assert!(message.contains("/srv/models"));
        assert!(message.contains("ALLOW_STUB=1"));
    }

    #[test]
    fn test_processing_stage_display() {
        assert_eq!(ProcessingStage::PostProcessing.to_string(), "post-processing");
        assert_eq!(ProcessingStage::TensorOperation.to_string(), "tensor operation");
    }
}
