//! Trait definitions for the classification pipeline.

pub mod runtime;

pub use runtime::{LoadOptions, ModelRuntime, RuntimeInfo};
