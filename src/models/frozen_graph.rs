//! Frozen-graph adapter backed by `tract-tensorflow`.
//!
//! Accepts a frozen TensorFlow `GraphDef` (`.pb`) or a directory containing one. SavedModel
//! directories are handled by [`SavedModelRuntime`](super::SavedModelRuntime). The input
//! fact is pinned to `[1, H, W, 3]` at load time, so the size must be known before loading.
//! Keras `.h5` files are recognized but have no runtime.

use crate::core::errors::{InferResult, InferenceError, SimpleError};
use crate::domain::ModelKind;
use crate::domain::artifact::is_graph_file;
use crate::models::saved_model::SAVED_MODEL_FILE;
use std::path::{Path, PathBuf};

#[cfg(feature = "tensorflow")]
pub use enabled::FrozenGraphRuntime;

#[cfg(not(feature = "tensorflow"))]
pub use disabled::FrozenGraphRuntime;

/// Graph file names preferred inside a model directory, in order.
const PREFERRED_GRAPH_NAMES: [&str; 2] = ["frozen_graph.pb", "model.pb"];

/// Returns the file to load for a frozen-graph artifact.
///
/// A file is used as-is. Inside a directory, `frozen_graph.pb` wins, then `model.pb`, then
/// the first other `.pb` by name. `saved_model.pb` is never picked.
pub fn select_graph_file(path: &Path) -> InferResult<PathBuf> {
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }

    for name in PREFERRED_GRAPH_NAMES {
        let candidate = path.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    let mut graphs: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| is_graph_file(p))
        .collect();
    graphs.sort();

    let saved_model = graphs
        .iter()
        .any(|p| p.file_name().is_some_and(|n| n == SAVED_MODEL_FILE));
    match graphs
        .into_iter()
        .find(|p| p.file_name().is_none_or(|n| n != SAVED_MODEL_FILE))
    {
        Some(graph) => Ok(graph),
        None if saved_model => Err(InferenceError::artifact_load_failed(
            path,
            "SavedModel bundles are not frozen graphs",
            SimpleError::new("load the directory with SavedModelRuntime"),
        )),
        None => Err(InferenceError::artifact_load_failed(
            path,
            "directory contains no graph file",
            SimpleError::new("expected a .pb file"),
        )),
    }
}

fn is_keras_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("h5"))
}

fn keras_unavailable() -> InferenceError {
    InferenceError::runtime_unavailable(
        ModelKind::FrozenGraph,
        "keras-hdf5",
        "export the Keras model to ONNX or a frozen .pb graph",
    )
}

#[cfg(feature = "tensorflow")]
mod enabled {
    use super::{is_keras_file, keras_unavailable, select_graph_file};
    use crate::core::config::{InputLayout, InputSpec};
    use crate::core::errors::{InferResult, InferenceError};
    use crate::core::traits::{LoadOptions, ModelRuntime, RuntimeInfo};
    use crate::domain::ModelKind;
    use crate::utils::tensor::{Tensor4D, contiguous_data, first_batch_item};
    use std::path::{Path, PathBuf};
    use tracing::{debug, info};
    use tract_tensorflow::prelude::*;

    /// A loaded, optimized frozen TensorFlow graph.
    pub struct FrozenGraphRuntime {
        plan: TypedRunnableModel<TypedModel>,
        input_spec: InputSpec,
        model_path: PathBuf,
        model_name: String,
    }

    impl std::fmt::Debug for FrozenGraphRuntime {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FrozenGraphRuntime")
                .field("input_spec", &self.input_spec)
                .field("model_path", &self.model_path)
                .field("model_name", &self.model_name)
                .finish()
        }
    }

    impl ModelRuntime for FrozenGraphRuntime {
        fn load(path: &Path, options: &LoadOptions) -> InferResult<Self> {
            if is_keras_file(path) {
                return Err(keras_unavailable());
            }

            let graph_path = select_graph_file(path)?;
            let size = options.input_size;
            let fact = f32::fact([1, size.height as usize, size.width as usize, 3]);

            let plan = tract_tensorflow::tensorflow()
                .model_for_path(&graph_path)
                .and_then(|model| model.with_input_fact(0, fact.into()))
                .and_then(|model| model.into_optimized())
                .and_then(|model| model.into_runnable())
                .map_err(|e| {
                    InferenceError::artifact_load_failed(
                        &graph_path,
                        "failed to load frozen TensorFlow graph",
                        e,
                    )
                })?;

            let model_name = graph_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown_model")
                .to_string();
            info!(
                "Loaded frozen graph '{}' from {} with input [1, {}, {}, 3]",
                model_name,
                graph_path.display(),
                size.height,
                size.width
            );

            Ok(Self {
                plan,
                input_spec: InputSpec {
                    layout: InputLayout::ChannelLast,
                    size: Some(size),
                },
                model_path: path.to_path_buf(),
                model_name,
            })
        }

        fn info(&self) -> RuntimeInfo {
            RuntimeInfo {
                model_name: self.model_name.clone(),
                kind: ModelKind::FrozenGraph,
                model_path: self.model_path.clone(),
            }
        }

        fn input_spec(&self) -> InputSpec {
            self.input_spec
        }

        fn run(&mut self, batch: &Tensor4D) -> InferResult<Vec<f32>> {
            let view = batch.view();
            let data = contiguous_data(&view)?;
            let input = Tensor::from_shape::<f32>(batch.shape(), data).map_err(|e| {
                InferenceError::inference_failed(&self.model_name, "building input tensor", e)
            })?;

            let outputs = self.plan.run(tvec!(input.into())).map_err(|e| {
                InferenceError::inference_failed(&self.model_name, "graph execution", e)
            })?;
            let output = outputs.first().ok_or_else(|| {
                InferenceError::inference_failed(
                    &self.model_name,
                    "reading graph output",
                    "graph produced no outputs",
                )
            })?;

            let values = output.as_slice::<f32>().map_err(|e| {
                InferenceError::inference_failed(&self.model_name, "reading output as f32", e)
            })?;
            debug!("Frozen graph output shape {:?}", output.shape());
            first_batch_item(output.shape(), values)
        }
    }
}

#[cfg(not(feature = "tensorflow"))]
mod disabled {
    use super::{is_keras_file, keras_unavailable};
    use crate::core::config::InputSpec;
    use crate::core::errors::{InferResult, InferenceError};
    use crate::core::traits::{LoadOptions, ModelRuntime, RuntimeInfo};
    use crate::domain::ModelKind;
    use crate::utils::tensor::Tensor4D;
    use std::path::Path;

    /// Placeholder for the frozen-graph adapter when the `tensorflow` feature is off; it
    /// cannot be loaded.
    #[derive(Debug)]
    pub enum FrozenGraphRuntime {}

    impl ModelRuntime for FrozenGraphRuntime {
        fn load(path: &Path, _options: &LoadOptions) -> InferResult<Self> {
            if is_keras_file(path) {
                return Err(keras_unavailable());
            }
            Err(InferenceError::runtime_unavailable(
                ModelKind::FrozenGraph,
                "tract",
                "rebuild with the `tensorflow` feature enabled",
            ))
        }

        fn info(&self) -> RuntimeInfo {
            match *self {}
        }

        fn input_spec(&self) -> InputSpec {
            match *self {}
        }

        fn run(&mut self, _batch: &Tensor4D) -> InferResult<Vec<f32>> {
            match *self {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_preferred_graph_names_win() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pb"), b"").unwrap();
        fs::write(dir.path().join("model.pb"), b"").unwrap();
        assert_eq!(
            select_graph_file(dir.path()).unwrap(),
            dir.path().join("model.pb")
        );

        fs::write(dir.path().join("frozen_graph.pb"), b"").unwrap();
        assert_eq!(
            select_graph_file(dir.path()).unwrap(),
            dir.path().join("frozen_graph.pb")
        );
    }

    #[test]
    fn test_other_graphs_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("zeta.pb"), b"").unwrap();
        fs::write(dir.path().join("beta.pb"), b"").unwrap();
        fs::write(dir.path().join("saved_model.pb"), b"").unwrap();
        assert_eq!(
            select_graph_file(dir.path()).unwrap(),
            dir.path().join("beta.pb")
        );
    }

    #[test]
    fn test_saved_model_only_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("saved_model.pb"), b"").unwrap();
        fs::create_dir(dir.path().join("variables")).unwrap();

        let err = select_graph_file(dir.path()).unwrap_err();
        assert!(matches!(err, InferenceError::ArtifactLoadFailed { .. }));
        assert!(err.to_string().contains("SavedModel"));
    }

    #[test]
    fn test_file_is_used_as_is() {
        let path = Path::new("weights/graph.pb");
        assert_eq!(select_graph_file(path).unwrap(), path.to_path_buf());
    }

    #[test]
    fn test_keras_has_no_runtime() {
        use crate::core::traits::{LoadOptions, ModelRuntime};
        let err = FrozenGraphRuntime::load(Path::new("model.h5"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            InferenceError::RuntimeUnavailable {
                runtime: "keras-hdf5",
                ..
            }
        ));
    }
}
