//! SavedModel adapter backed by libtensorflow through the `tensorflow` crate.
//!
//! A SavedModel is a directory holding `saved_model.pb` and a `variables/` folder. It is
//! loaded with the `serve` tag and executed through its `serving_default` signature, fed the
//! signature's first input (by key) and read from its first output.

use std::path::Path;

#[cfg(feature = "tensorflow")]
pub use enabled::SavedModelRuntime;

#[cfg(not(feature = "tensorflow"))]
pub use disabled::SavedModelRuntime;

/// Graph file that marks a SavedModel directory.
pub const SAVED_MODEL_FILE: &str = "saved_model.pb";

/// Returns true when `path` is a directory holding a `saved_model.pb`.
pub fn is_saved_model(path: &Path) -> bool {
    path.is_dir() && path.join(SAVED_MODEL_FILE).is_file()
}

#[cfg(feature = "tensorflow")]
mod enabled {
    use crate::core::config::InputSpec;
    use crate::core::errors::{InferResult, InferenceError, SimpleError};
    use crate::core::traits::{LoadOptions, ModelRuntime, RuntimeInfo};
    use crate::domain::ModelKind;
    use crate::utils::tensor::{Tensor4D, contiguous_data, first_batch_item};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use tensorflow::{
        Graph, SavedModelBundle, SessionOptions, SessionRunArgs, Shape, Tensor, TensorInfo,
    };
    use tracing::{debug, info};

    const SERVE_TAG: &str = "serve";
    const SERVING_SIGNATURE: &str = "serving_default";

    /// An operation output addressed by name and index.
    #[derive(Debug, Clone)]
    struct Endpoint {
        operation: String,
        index: i32,
    }

    impl Endpoint {
        fn from_info(info: &TensorInfo) -> Self {
            Self {
                operation: info.name().name.clone(),
                index: info.name().index,
            }
        }
    }

    /// A loaded TensorFlow SavedModel.
    pub struct SavedModelRuntime {
        bundle: SavedModelBundle,
        graph: Graph,
        input: Endpoint,
        output: Endpoint,
        input_spec: InputSpec,
        model_path: PathBuf,
        model_name: String,
    }

    impl std::fmt::Debug for SavedModelRuntime {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SavedModelRuntime")
                .field("input", &self.input)
                .field("output", &self.output)
                .field("input_spec", &self.input_spec)
                .field("model_path", &self.model_path)
                .field("model_name", &self.model_name)
                .finish()
        }
    }

    /// Entry with the smallest key, so the choice does not depend on map order.
    fn first_by_key(map: &HashMap<String, TensorInfo>) -> Option<&TensorInfo> {
        map.iter().min_by(|a, b| a.0.cmp(b.0)).map(|(_, info)| info)
    }

    /// Declared dimensions, with unknown ones as `-1`.
    fn declared_dims(shape: &Shape) -> Vec<i64> {
        (0..shape.dims().unwrap_or(0))
            .map(|i| shape[i].unwrap_or(-1))
            .collect()
    }

    impl ModelRuntime for SavedModelRuntime {
        fn load(path: &Path, _options: &LoadOptions) -> InferResult<Self> {
            let mut graph = Graph::new();
            let bundle =
                SavedModelBundle::load(&SessionOptions::new(), [SERVE_TAG], &mut graph, path)
                    .map_err(|e| {
                        InferenceError::artifact_load_failed(
                            path,
                            "failed to load TensorFlow SavedModel",
                            e.to_string(),
                        )
                    })?;

            let signature = bundle
                .meta_graph_def()
                .get_signature(SERVING_SIGNATURE)
                .map_err(|e| {
                    InferenceError::artifact_load_failed(
                        path,
                        format!("SavedModel has no '{SERVING_SIGNATURE}' signature"),
                        e.to_string(),
                    )
                })?;
            let input_info = first_by_key(signature.inputs()).ok_or_else(|| {
                InferenceError::artifact_load_failed(
                    path,
                    "serving signature declares no inputs",
                    SimpleError::new("empty input map"),
                )
            })?;
            let output_info = first_by_key(signature.outputs()).ok_or_else(|| {
                InferenceError::artifact_load_failed(
                    path,
                    "serving signature declares no outputs",
                    SimpleError::new("empty output map"),
                )
            })?;

            let declared = declared_dims(input_info.shape());
            let input_spec = InputSpec::from_declared_shape(&declared);
            let input = Endpoint::from_info(input_info);
            let output = Endpoint::from_info(output_info);

            let model_name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown_model")
                .to_string();
            info!(
                "Loaded SavedModel '{}' (input '{}:{}' {:?} -> {}, output '{}:{}')",
                model_name,
                input.operation,
                input.index,
                declared,
                input_spec.layout,
                output.operation,
                output.index
            );

            Ok(Self {
                bundle,
                graph,
                input,
                output,
                input_spec,
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
            let failed = |context: &str, e: String| {
                InferenceError::inference_failed(&self.model_name, context.to_string(), e)
            };

            let view = batch.view();
            let data = contiguous_data(&view)?;
            let dims: Vec<u64> = batch.shape().iter().map(|&d| d as u64).collect();
            let input = Tensor::<f32>::new(&dims)
                .with_values(data)
                .map_err(|e| failed("building input tensor", e.to_string()))?;

            let input_op = self
                .graph
                .operation_by_name_required(&self.input.operation)
                .map_err(|e| failed("looking up input operation", e.to_string()))?;
            let output_op = self
                .graph
                .operation_by_name_required(&self.output.operation)
                .map_err(|e| failed("looking up output operation", e.to_string()))?;

            let mut args = SessionRunArgs::new();
            args.add_feed(&input_op, self.input.index, &input);
            let token = args.request_fetch(&output_op, self.output.index);
            self.bundle
                .session
                .run(&mut args)
                .map_err(|e| failed("session run", e.to_string()))?;

            let output: Tensor<f32> = args
                .fetch(token)
                .map_err(|e| failed("reading output as f32", e.to_string()))?;
            let shape: Vec<usize> = output.dims().iter().map(|&d| d as usize).collect();
            debug!("SavedModel output shape {:?}", shape);
            first_batch_item(&shape, &output)
        }
    }
}

#[cfg(not(feature = "tensorflow"))]
mod disabled {
    use crate::core::config::InputSpec;
    use crate::core::errors::{InferResult, InferenceError};
    use crate::core::traits::{LoadOptions, ModelRuntime, RuntimeInfo};
    use crate::domain::ModelKind;
    use crate::utils::tensor::Tensor4D;
    use std::path::Path;

    /// Placeholder for the SavedModel adapter when the `tensorflow` feature is off; it cannot
    /// be loaded.
    #[derive(Debug)]
    pub enum SavedModelRuntime {}

    impl ModelRuntime for SavedModelRuntime {
        fn load(_path: &Path, _options: &LoadOptions) -> InferResult<Self> {
            Err(InferenceError::runtime_unavailable(
                ModelKind::FrozenGraph,
                "libtensorflow",
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
