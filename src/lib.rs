//! # MediConnect ML
//!
//! A model-agnostic image classification pipeline. A model is located once at startup,
//! loaded with the runtime that matches its format, and then serves top-1 predictions for
//! arbitrary images.
//!
//! ## Features
//!
//! - Automatic model discovery in a directory, or an explicit model path
//! - ONNX graphs through ONNX Runtime (`onnx`, default)
//! - TorchScript modules through libtorch (`torch`)
//! - Frozen TensorFlow graphs through tract and SavedModel directories through libtensorflow
//!   (`tensorflow`)
//! - Input size and tensor layout discovered from the model's declared input
//! - Fail-open startup: a missing or broken model never aborts the process
//! - An opt-in deterministic stub for development without a model
//!
//! ## Modules
//!
//! * [`core`] - Configuration, errors, constants and the runtime trait
//! * [`domain`] - Model artifacts, labels and inference results
//! * [`models`] - Runtime adapters for each model format
//! * [`pipeline`] - Model resolution, pipeline state and the [`Classifier`](pipeline::Classifier) façade
//! * [`processors`] - Preprocessing and softmax post-processing
//! * [`utils`] - Image loading and tensor layout helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mediconnect_ml::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! mediconnect_ml::core::init_tracing();
//!
//! // MODEL_DIR, MODEL_PATH, MODEL_INPUT_SIZE, MODEL_LABELS and ALLOW_STUB are honoured.
//! let classifier = Classifier::from_config(&PipelineConfig::from_env());
//! println!("{:?}", classifier.health());
//!
//! let image = load_image(std::path::Path::new("lesion.jpg"))?;
//! let result = classifier.classify(&image)?;
//! println!("{} ({:.1}%)", result.label, result.confidence * 100.0);
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod core;
pub mod domain;
pub mod models;

pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use mediconnect_ml::prelude::*;
/// ```
///
/// Included items cover the common path:
/// - Configuration (`PipelineConfig`, `InputSize`)
/// - The façade and its outputs (`Classifier`, `InferenceResult`, `InferenceDetails`, `HealthReport`)
/// - Error and result types (`InferenceError`, `InferResult`)
/// - Basic image loading (`load_image`)
///
/// For adapters, resolution internals and processors, import from the respective modules.
pub mod prelude {
    pub use crate::core::config::{InputSize, PipelineConfig};
    pub use crate::core::{InferResult, InferenceError};
    pub use crate::domain::{InferenceDetails, InferenceResult, LabelSet, ModelKind};
    pub use crate::pipeline::{Classifier, HealthReport, PipelineState};
    pub use crate::utils::load_image;
}
