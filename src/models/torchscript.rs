//! Traced-script adapter backed by libtorch through `tch`.
//!
//! Modules are loaded on the CPU, switched to eval mode and run under `no_grad`. Input is
//! always channel-first `[1, 3, H, W]`.

#[cfg(feature = "torch")]
pub use enabled::TorchScriptRuntime;

#[cfg(not(feature = "torch"))]
pub use disabled::TorchScriptRuntime;

#[cfg(feature = "torch")]
mod enabled {
    use crate::core::config::{InputLayout, InputSpec};
    use crate::core::errors::{InferResult, InferenceError, SimpleError};
    use crate::core::traits::{LoadOptions, ModelRuntime, RuntimeInfo};
    use crate::domain::ModelKind;
    use crate::utils::tensor::{Tensor4D, contiguous_data, first_batch_item};
    use std::path::{Path, PathBuf};
    use tch::{CModule, Device, IValue, Kind, Tensor};
    use tracing::{debug, info};

    /// A loaded TorchScript module.
    pub struct TorchScriptRuntime {
        module: CModule,
        model_path: PathBuf,
        model_name: String,
    }

    impl std::fmt::Debug for TorchScriptRuntime {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("TorchScriptRuntime")
                .field("model_path", &self.model_path)
                .field("model_name", &self.model_name)
                .finish()
        }
    }

    /// Picks the logits tensor from a module's output; tuples and lists yield their first tensor.
    fn first_tensor(value: IValue) -> Option<Tensor> {
        match value {
            IValue::Tensor(t) => Some(t),
            IValue::Tuple(items) | IValue::GenericList(items) => {
                items.into_iter().find_map(first_tensor)
            }
            IValue::TensorList(items) => items.into_iter().next(),
            _ => None,
        }
    }

    impl ModelRuntime for TorchScriptRuntime {
        fn load(path: &Path, _options: &LoadOptions) -> InferResult<Self> {
            let mut module = CModule::load_on_device(path, Device::Cpu).map_err(|e| {
                InferenceError::artifact_load_failed(path, "failed to load TorchScript module", e)
            })?;
            module.set_eval();

            let model_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown_model")
                .to_string();
            info!("Loaded TorchScript model '{}' on CPU", model_name);

            Ok(Self {
                module,
                model_path: path.to_path_buf(),
                model_name,
            })
        }

        fn info(&self) -> RuntimeInfo {
            RuntimeInfo {
                model_name: self.model_name.clone(),
                kind: ModelKind::TracedScript,
                model_path: self.model_path.clone(),
            }
        }

        fn input_spec(&self) -> InputSpec {
            InputSpec::fixed(InputLayout::ChannelFirst)
        }

        fn run(&mut self, batch: &Tensor4D) -> InferResult<Vec<f32>> {
            let view = batch.view();
            let data = contiguous_data(&view)?;
            let dims: Vec<i64> = batch.shape().iter().map(|&d| d as i64).collect();
            let input = Tensor::from_slice(data).reshape(dims.as_slice());

            let output = tch::no_grad(|| self.module.forward_is(&[IValue::Tensor(input)]))
                .map_err(|e| {
                    InferenceError::inference_failed(&self.model_name, "forward pass", e)
                })?;
            let logits = first_tensor(output).ok_or_else(|| {
                InferenceError::inference_failed(
                    &self.model_name,
                    "reading module output",
                    SimpleError::new("module returned no tensor"),
                )
            })?;

            let shape: Vec<usize> = logits.size().iter().map(|&d| d.max(0) as usize).collect();
            debug!("TorchScript output shape {:?}", shape);
            let flat = logits.to_kind(Kind::Float).flatten(0, -1);
            let values = Vec::<f32>::try_from(&flat).map_err(|e| {
                InferenceError::inference_failed(&self.model_name, "copying output to host", e)
            })?;
            first_batch_item(&shape, &values)
        }
    }
}

#[cfg(not(feature = "torch"))]
mod disabled {
    use crate::core::config::InputSpec;
    use crate::core::errors::{InferResult, InferenceError};
    use crate::core::traits::{LoadOptions, ModelRuntime, RuntimeInfo};
    use crate::domain::ModelKind;
    use crate::utils::tensor::Tensor4D;
    use std::path::Path;

    /// Placeholder for the TorchScript adapter when the `torch` feature is off; it cannot be
    /// loaded.
    #[derive(Debug)]
    pub enum TorchScriptRuntime {}

    impl ModelRuntime for TorchScriptRuntime {
        fn load(_path: &Path, _options: &LoadOptions) -> InferResult<Self> {
            Err(InferenceError::runtime_unavailable(
                ModelKind::TracedScript,
                "libtorch",
                "rebuild with the `torch` feature enabled and LIBTORCH pointing at a libtorch install",
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
