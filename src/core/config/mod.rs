//! Configuration types for the classification pipeline.

pub mod errors;
pub mod model_input;
pub mod onnx;
pub mod pipeline;

pub use errors::{ConfigError, ConfigValidator};
pub use model_input::{
    Dim, InputLayout, InputSize, InputSpec, NormalizationConfig, negotiate_input_size,
};
pub use onnx::{OrtGraphOptimizationLevel, OrtSessionConfig};
pub use pipeline::{PipelineConfig, parse_label_list};
