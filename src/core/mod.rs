//! The core module of the classification pipeline.
//!
//! This module contains the fundamental components shared by every stage:
//! - Configuration management
//! - Constants used throughout the pipeline
//! - Error handling
//! - The runtime capability trait implemented by model adapters
//!
//! It also provides re-exports of commonly used types and functions for convenience.

pub mod config;
pub mod constants;
pub mod errors;
pub mod traits;

pub use config::{
    ConfigError, ConfigValidator, InputLayout, InputSize, InputSpec, OrtSessionConfig,
    PipelineConfig,
};
pub use constants::*;
pub use errors::{InferResult, InferenceError, ProcessingStage};
pub use traits::{LoadOptions, ModelRuntime, RuntimeInfo};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
