//! The pipeline state fixed at startup and the handle to a loaded model.

use crate::core::config::{InputLayout, InputSize};
use crate::core::errors::{InferResult, InferenceError, SimpleError};
use crate::core::traits::{ModelRuntime, RuntimeInfo};
use crate::domain::ModelKind;
use crate::utils::tensor::{Tensor3D, to_batched_layout};
use std::sync::Mutex;
use tracing::debug;

/// A loaded runtime together with the size and layout it is fed.
///
/// Forward passes are serialized through a mutex, so a handle can be shared between threads
/// even when the underlying runtime does not support concurrent execution.
#[derive(Debug)]
pub struct RuntimeHandle {
    runtime: Mutex<Box<dyn ModelRuntime>>,
    input_size: InputSize,
    layout: InputLayout,
    info: RuntimeInfo,
}

impl RuntimeHandle {
    /// Wraps `runtime`, which will be fed images of `input_size`.
    pub fn new(runtime: Box<dyn ModelRuntime>, input_size: InputSize) -> Self {
        let layout = runtime.input_spec().layout;
        let info = runtime.info();
        Self {
            runtime: Mutex::new(runtime),
            input_size,
            layout,
            info,
        }
    }

    /// Negotiated spatial size.
    pub fn input_size(&self) -> InputSize {
        self.input_size
    }

    /// Layout the runtime is fed in.
    pub fn layout(&self) -> InputLayout {
        self.layout
    }

    /// Information reported by the runtime at load time.
    pub fn info(&self) -> &RuntimeInfo {
        &self.info
    }

    /// Kind of the loaded artifact.
    pub fn kind(&self) -> ModelKind {
        self.info.kind
    }

    /// Runs the model on a preprocessed `[3, H, W]` tensor and returns its raw outputs.
    ///
    /// Every failure is reported as `InferenceFailed` with the original cause attached.
    pub fn run(&self, chw: &Tensor3D) -> InferResult<Vec<f32>> {
        let batch = to_batched_layout(chw, self.layout);
        debug!(
            "Running '{}' on {} tensor {:?}",
            self.info.model_name,
            self.layout,
            batch.shape()
        );

        let mut runtime = self.runtime.lock().map_err(|_| {
            InferenceError::inference_failed(
                &self.info.model_name,
                "acquiring runtime lock",
                SimpleError::new("runtime lock poisoned by an earlier panic"),
            )
        })?;

        runtime.run(&batch).map_err(|e| match e {
            InferenceError::InferenceFailed { .. } => e,
            other => InferenceError::inference_failed(&self.info.model_name, "forward pass", other),
        })
    }
}

/// What the classifier can do, decided once when the model is resolved.
#[derive(Debug)]
pub enum PipelineState {
    /// No model could be loaded and the stub is disabled.
    Unloaded,
    /// A model is loaded and ready.
    Loaded(RuntimeHandle),
    /// No model is loaded; the development stub answers instead.
    StubEnabled,
}

impl PipelineState {
    /// Returns true when a real model is loaded.
    pub fn is_loaded(&self) -> bool {
        matches!(self, PipelineState::Loaded(_))
    }

    /// Returns true when the development stub answers requests.
    pub fn is_stub(&self) -> bool {
        matches!(self, PipelineState::StubEnabled)
    }

    /// Kind of the loaded model, if any.
    pub fn model_kind(&self) -> Option<ModelKind> {
        match self {
            PipelineState::Loaded(handle) => Some(handle.kind()),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::config::InputSpec;
    use crate::core::traits::LoadOptions;
    use crate::utils::tensor::Tensor4D;
    use std::path::{Path, PathBuf};

    /// Runtime that records the batch shape it was given and echoes fixed logits.
    #[derive(Debug)]
    pub(crate) struct FakeRuntime {
        pub spec: InputSpec,
        pub logits: Vec<f32>,
        pub fail: bool,
        pub seen: Vec<Vec<usize>>,
    }

    impl FakeRuntime {
        pub(crate) fn new(spec: InputSpec, logits: Vec<f32>) -> Self {
            Self {
                spec,
                logits,
                fail: false,
                seen: Vec::new(),
            }
        }
    }

    impl ModelRuntime for FakeRuntime {
        fn load(_path: &Path, _options: &LoadOptions) -> InferResult<Self> {
            Err(InferenceError::invalid_input("fake runtimes are built directly"))
        }

        fn info(&self) -> RuntimeInfo {
            RuntimeInfo {
                model_name: "fake".to_string(),
                kind: ModelKind::GraphExecution,
                model_path: PathBuf::from("fake.onnx"),
            }
        }

        fn input_spec(&self) -> InputSpec {
            self.spec
        }

        fn run(&mut self, batch: &Tensor4D) -> InferResult<Vec<f32>> {
            self.seen.push(batch.shape().to_vec());
            if self.fail {
                return Err(InferenceError::invalid_input("boom"));
            }
            Ok(self.logits.clone())
        }
    }

    #[test]
    fn test_handle_feeds_declared_layout() {
        let runtime = FakeRuntime::new(InputSpec::fixed(InputLayout::ChannelLast), vec![1.0]);
        let handle = RuntimeHandle::new(Box::new(runtime), InputSize::new(4, 6));
        assert_eq!(handle.layout(), InputLayout::ChannelLast);

        let out = handle.run(&Tensor3D::zeros((3, 4, 6))).unwrap();
        assert_eq!(out, vec![1.0]);

        let runtime = handle.runtime.lock().unwrap();
        let debug = format!("{runtime:?}");
        assert!(debug.contains("[1, 4, 6, 3]"));
    }

    #[test]
    fn test_run_errors_become_inference_failed() {
        let mut runtime = FakeRuntime::new(InputSpec::fixed(InputLayout::ChannelFirst), vec![]);
        runtime.fail = true;
        let handle = RuntimeHandle::new(Box::new(runtime), InputSize::new(2, 2));

        let err = handle.run(&Tensor3D::zeros((3, 2, 2))).unwrap_err();
        assert!(matches!(err, InferenceError::InferenceFailed { .. }));
    }

    #[test]
    fn test_state_queries() {
        assert!(PipelineState::StubEnabled.is_stub());
        assert!(!PipelineState::Unloaded.is_loaded());
        assert_eq!(PipelineState::Unloaded.model_kind(), None);

        let runtime = FakeRuntime::new(InputSpec::fixed(InputLayout::ChannelFirst), vec![0.0]);
        let loaded = PipelineState::Loaded(RuntimeHandle::new(
            Box::new(runtime),
            InputSize::default(),
        ));
        assert_eq!(loaded.model_kind(), Some(ModelKind::GraphExecution));
    }
}
