//! The classification pipeline.
//!
//! [`ModelResolver`] runs once at startup: it locates a model artifact, loads it with the
//! matching runtime adapter, negotiates the input size and picks the labels. The resulting
//! [`PipelineState`] is moved into a [`Classifier`], which serves every request from then on.

mod classifier;
mod resolver;
pub mod state;
mod stub;

pub use classifier::{Classifier, HealthReport};
pub use resolver::{ModelResolver, Resolution};
pub use state::{PipelineState, RuntimeHandle};
pub use stub::classify_stub;
