//! Graph-execution adapter backed by ONNX Runtime.
//!
//! One session is created per model. The first declared input and output names are captured
//! at load time, and the first input's declared shape decides the layout and, when fixed,
//! the spatial size the model is fed.

#[cfg(feature = "onnx")]
pub use enabled::OnnxRuntime;

#[cfg(not(feature = "onnx"))]
pub use disabled::OnnxRuntime;

#[cfg(feature = "onnx")]
mod enabled {
    use crate::core::config::{InputSpec, OrtGraphOptimizationLevel, OrtSessionConfig};
    use crate::core::errors::{InferResult, InferenceError, SimpleError};
    use crate::core::traits::{LoadOptions, ModelRuntime, RuntimeInfo};
    use crate::domain::ModelKind;
    use crate::utils::tensor::{Tensor4D, first_batch_item};
    use ort::logging::LogLevel;
    use ort::session::Session;
    use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
    use ort::value::{TensorRef, ValueType};
    use std::path::{Path, PathBuf};
    use tracing::{debug, info};

    /// A loaded ONNX model.
    pub struct OnnxRuntime {
        session: Session,
        input_name: String,
        output_name: String,
        input_spec: InputSpec,
        model_path: PathBuf,
        model_name: String,
    }

    impl std::fmt::Debug for OnnxRuntime {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("OnnxRuntime")
                .field("input_name", &self.input_name)
                .field("output_name", &self.output_name)
                .field("input_spec", &self.input_spec)
                .field("model_path", &self.model_path)
                .field("model_name", &self.model_name)
                .finish()
        }
    }

    impl OnnxRuntime {
        fn apply_ort_config(
            mut builder: SessionBuilder,
            cfg: &OrtSessionConfig,
        ) -> Result<SessionBuilder, ort::Error> {
            if let Some(intra) = cfg.intra_threads {
                builder = builder.with_intra_threads(intra)?;
            }
            if let Some(inter) = cfg.inter_threads {
                builder = builder.with_inter_threads(inter)?;
            }
            if let Some(level) = cfg.optimization_level {
                use OrtGraphOptimizationLevel as OG;
                let mapped = match level {
                    OG::DisableAll => GraphOptimizationLevel::Disable,
                    OG::Level1 => GraphOptimizationLevel::Level1,
                    OG::Level2 => GraphOptimizationLevel::Level2,
                    OG::Level3 => GraphOptimizationLevel::Level3,
                };
                builder = builder.with_optimization_level(mapped)?;
            }
            Ok(builder)
        }

        fn build_session(path: &Path, cfg: Option<&OrtSessionConfig>) -> Result<Session, ort::Error> {
            let builder = Session::builder()?.with_log_level(LogLevel::Error)?;
            let builder = match cfg {
                Some(cfg) => Self::apply_ort_config(builder, cfg)?,
                None => builder,
            };
            builder.commit_from_file(path)
        }

        /// Declared shape of the first input, with dynamic dimensions as-is.
        fn declared_input_shape(session: &Session) -> Option<Vec<i64>> {
            let input = session.inputs.first()?;
            match &input.input_type {
                ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
                _ => None,
            }
        }
    }

    impl ModelRuntime for OnnxRuntime {
        fn load(path: &Path, options: &LoadOptions) -> InferResult<Self> {
            let session =
                Self::build_session(path, options.ort_session.as_ref()).map_err(|e| {
                    InferenceError::artifact_load_failed(path, "failed to create ONNX session", e)
                })?;

            let input_name = session
                .inputs
                .first()
                .map(|input| input.name.clone())
                .ok_or_else(|| {
                    InferenceError::artifact_load_failed(
                        path,
                        "model declares no inputs",
                        SimpleError::new("empty input list"),
                    )
                })?;
            let output_name = session
                .outputs
                .first()
                .map(|output| output.name.clone())
                .ok_or_else(|| {
                    InferenceError::artifact_load_failed(
                        path,
                        "model declares no outputs",
                        SimpleError::new("empty output list"),
                    )
                })?;

            let declared = Self::declared_input_shape(&session).unwrap_or_default();
            let input_spec = InputSpec::from_declared_shape(&declared);
            let model_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown_model")
                .to_string();

            info!(
                "Loaded ONNX model '{}' (input '{}' {:?} -> {}, output '{}')",
                model_name, input_name, declared, input_spec.layout, output_name
            );

            Ok(Self {
                session,
                input_name,
                output_name,
                input_spec,
                model_path: path.to_path_buf(),
                model_name,
            })
        }

        fn info(&self) -> RuntimeInfo {
            RuntimeInfo {
                model_name: self.model_name.clone(),
                kind: ModelKind::GraphExecution,
                model_path: self.model_path.clone(),
            }
        }

        fn input_spec(&self) -> InputSpec {
            self.input_spec
        }

        fn run(&mut self, batch: &Tensor4D) -> InferResult<Vec<f32>> {
            let input_shape = batch.shape().to_vec();
            let input_tensor = TensorRef::from_array_view(batch.view()).map_err(|e| {
                InferenceError::inference_failed(
                    &self.model_name,
                    format!("failed to convert input tensor with shape {input_shape:?}"),
                    e,
                )
            })?;

            let inputs = ort::inputs![self.input_name.as_str() => input_tensor];
            let outputs = self.session.run(inputs).map_err(|e| {
                InferenceError::inference_failed(
                    &self.model_name,
                    format!(
                        "ONNX Runtime inference failed with input '{}' -> output '{}'",
                        self.input_name, self.output_name
                    ),
                    e,
                )
            })?;

            let (output_shape, output_data) = outputs[self.output_name.as_str()]
                .try_extract_tensor::<f32>()
                .map_err(|e| {
                    InferenceError::inference_failed(
                        &self.model_name,
                        format!("failed to extract output tensor '{}' as f32", self.output_name),
                        e,
                    )
                })?;

            let shape: Vec<usize> = output_shape.iter().map(|&d| d.max(0) as usize).collect();
            debug!("ONNX output '{}' shape {:?}", self.output_name, shape);
            first_batch_item(&shape, output_data)
        }
    }
}

#[cfg(not(feature = "onnx"))]
mod disabled {
    use crate::core::config::InputSpec;
    use crate::core::errors::{InferResult, InferenceError};
    use crate::core::traits::{LoadOptions, ModelRuntime, RuntimeInfo};
    use crate::domain::ModelKind;
    use crate::utils::tensor::Tensor4D;
    use std::path::Path;

    /// Placeholder for the ONNX adapter when the `onnx` feature is off; it cannot be loaded.
    #[derive(Debug)]
    pub enum OnnxRuntime {}

    impl ModelRuntime for OnnxRuntime {
        fn load(_path: &Path, _options: &LoadOptions) -> InferResult<Self> {
            Err(InferenceError::runtime_unavailable(
                ModelKind::GraphExecution,
                "onnxruntime",
                "rebuild with the `onnx` feature enabled",
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
