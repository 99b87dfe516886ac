//! Domain-level structures shared across the classification pipeline.
//!
//! This module groups the model artifact, label and result types that flow between the
//! resolver, the runtime adapters and the caller.

pub mod artifact;
pub mod labels;
pub mod result;

pub use crate::core::config::{InputLayout, InputSpec};
pub use artifact::{ModelArtifact, ModelKind};
pub use labels::{LabelSet, LabelSource};
pub use result::{InferenceDetails, InferenceResult};
