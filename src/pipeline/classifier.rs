//! The classification façade.

use super::resolver::{ModelResolver, Resolution};
use super::state::PipelineState;
use super::stub::classify_stub;
use crate::core::config::{InputSize, PipelineConfig};
use crate::core::errors::{InferResult, InferenceError};
use crate::domain::{InferenceResult, LabelSet, ModelKind};
use crate::processors::{Preprocessor, postprocess};
use crate::utils::image::{ensure_non_empty, load_image, load_image_from_memory};
use image::DynamicImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Liveness summary of a classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// Always `"ok"`; the classifier is usable even without a model.
    pub status: &'static str,
    /// Kind of the loaded model, if one is loaded.
    pub model_kind: Option<ModelKind>,
    /// Negotiated input size as (height, width).
    pub input_size: (u32, u32),
    /// First few labels, followed by `"..."` when more exist.
    pub labels: Vec<String>,
    /// Whether the development stub answers requests.
    pub stub_enabled: bool,
}

/// Classifies images with the model resolved at construction time.
///
/// The state is fixed once built. `Classifier` is `Send + Sync` and is meant to be shared,
/// for example behind an `Arc`, by every request handler of a process.
///
/// # Examples
///
/// ```rust
/// use image::{DynamicImage, GrayImage, Luma};
/// use mediconnect_ml::core::config::PipelineConfig;
/// use mediconnect_ml::pipeline::Classifier;
///
/// let dir = std::env::temp_dir().join("mediconnect-ml-doc-empty");
/// let config = PipelineConfig::new()
///     .with_model_dir(dir)
///     .with_labels(["low", "mid", "high"])
///     .with_allow_stub(true);
/// let classifier = Classifier::from_config(&config);
///
/// let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 100, Luma([128])));
/// let result = classifier.classify(&img).unwrap();
/// assert_eq!(result.label, "mid");
/// ```
#[derive(Debug)]
pub struct Classifier {
    state: PipelineState,
    labels: LabelSet,
    input_size: InputSize,
    search_dir: PathBuf,
    load_failure: Option<InferenceError>,
    preprocessor: Preprocessor,
}

impl Classifier {
    /// Builds a classifier from a finished resolution.
    pub fn new(resolution: Resolution, search_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: resolution.state,
            labels: resolution.labels,
            input_size: resolution.input_size,
            search_dir: search_dir.into(),
            load_failure: resolution.failure,
            preprocessor: Preprocessor::default(),
        }
    }

    /// Resolves the model described by `config`. Never fails; see [`Classifier::state`].
    pub fn from_config(config: &PipelineConfig) -> Self {
        let resolver = ModelResolver::new(config.clone());
        Self::new(resolver.resolve(), &config.model_dir)
    }

    /// Resolves the model described by the process environment.
    pub fn from_env() -> Self {
        Self::from_config(&PipelineConfig::from_env())
    }

    /// Classifies a decoded image.
    ///
    /// # Errors
    ///
    /// * `ModelUnavailable` when no model is loaded and the stub is disabled
    /// * `InvalidInput` for a zero-sized image
    /// * `InferenceFailed` when the model fails to run
    pub fn classify(&self, img: &DynamicImage) -> InferResult<InferenceResult> {
        if matches!(self.state, PipelineState::Unloaded) {
            return Err(InferenceError::ModelUnavailable {
                search_dir: self.search_dir.clone(),
            });
        }
        ensure_non_empty(img)?;

        match &self.state {
            PipelineState::Loaded(handle) => {
                let tensor = self.preprocessor.apply(img, handle.input_size())?;
                let logits = handle.run(&tensor)?;
                debug!("Model produced {} logits", logits.len());
                postprocess(&logits, &self.labels)
            }
            PipelineState::StubEnabled => Ok(classify_stub(img, &self.labels)),
            PipelineState::Unloaded => Err(InferenceError::ModelUnavailable {
                search_dir: self.search_dir.clone(),
            }),
        }
    }

    /// Decodes the image file at `path` and classifies it.
    pub fn classify_path(&self, path: impl AsRef<Path>) -> InferResult<InferenceResult> {
        let img = load_image(path.as_ref())?;
        self.classify(&img)
    }

    /// Decodes an encoded image (PNG, JPEG, ...) and classifies it.
    pub fn classify_bytes(&self, bytes: &[u8]) -> InferResult<InferenceResult> {
        let img = load_image_from_memory(bytes)?;
        self.classify(&img)
    }

    /// The state decided at construction: loaded, stub or unloaded.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Labels used to name the winning class.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Spatial size images are resized to.
    pub fn input_size(&self) -> InputSize {
        self.input_size
    }

    /// The error that kept a located model from loading, if any.
    pub fn load_failure(&self) -> Option<&InferenceError> {
        self.load_failure.as_ref()
    }

    /// Summarizes the classifier for a liveness endpoint.
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            model_kind: self.state.model_kind(),
            input_size: self.input_size.as_tuple(),
            labels: self.labels.preview(),
            stub_enabled: self.state.is_stub(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{InputLayout, InputSpec, negotiate_input_size};
    use crate::domain::InferenceDetails;
    use crate::pipeline::state::RuntimeHandle;
    use crate::pipeline::state::tests::FakeRuntime;

    fn loaded(spec: InputSpec, logits: Vec<f32>, labels: LabelSet) -> Classifier {
        let size = negotiate_input_size(None, spec.size);
        let handle = RuntimeHandle::new(Box::new(FakeRuntime::new(spec, logits)), size);
        Classifier::new(
            Resolution {
                state: PipelineState::Loaded(handle),
                labels,
                input_size: size,
                failure: None,
            },
            "models",
        )
    }

    #[test]
    fn test_loaded_model_path() {
        let spec = InputSpec {
            layout: InputLayout::ChannelFirst,
            size: Some(InputSize::new(64, 64)),
        };
        let classifier = loaded(spec, vec![0.1, 3.0, 0.2], LabelSet::explicit(["a", "b", "c"]));
        assert_eq!(classifier.input_size(), InputSize::new(64, 64));

        let result = classifier
            .classify(&DynamicImage::new_rgb8(300, 200))
            .unwrap();
        assert_eq!(result.label, "b");
        let probs = result.details.probabilities().unwrap();
        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unloaded_reports_search_dir() {
        let classifier = Classifier::new(
            Resolution {
                state: PipelineState::Unloaded,
                labels: LabelSet::default(),
                input_size: InputSize::default(),
                failure: None,
            },
            "/srv/models",
        );
        let err = classifier
            .classify(&DynamicImage::new_rgb8(10, 10))
            .unwrap_err();
        match err {
            InferenceError::ModelUnavailable { search_dir } => {
                assert_eq!(search_dir, PathBuf::from("/srv/models"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_sized_image_is_invalid() {
        let classifier = loaded(
            InputSpec::fixed(InputLayout::ChannelFirst),
            vec![1.0],
            LabelSet::default(),
        );
        let err = classifier
            .classify(&DynamicImage::new_rgb8(0, 5))
            .unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInput { .. }));
    }

    #[test]
    fn test_health_report() {
        let classifier = loaded(
            InputSpec::fixed(InputLayout::ChannelLast),
            vec![1.0],
            LabelSet::explicit(["a", "b", "c", "d", "e", "f"]),
        );
        let health = classifier.health();
        assert_eq!(health.status, "ok");
        assert_eq!(health.model_kind, Some(ModelKind::GraphExecution));
        assert_eq!(health.input_size, (224, 224));
        assert_eq!(health.labels.last().map(String::as_str), Some("..."));
        assert!(!health.stub_enabled);

        let value = serde_json::to_value(&health).unwrap();
        assert_eq!(value["model_kind"], "onnx");
    }

    #[test]
    fn test_stub_state_skips_model() {
        let classifier = Classifier::new(
            Resolution {
                state: PipelineState::StubEnabled,
                labels: LabelSet::default(),
                input_size: InputSize::default(),
                failure: None,
            },
            "models",
        );
        let result = classifier
            .classify(&DynamicImage::new_rgb8(8, 8))
            .unwrap();
        assert!(matches!(result.details, InferenceDetails::Stub { .. }));
        assert_eq!(result.label, "classA");
        assert!(classifier.health().stub_enabled);
    }

    #[test]
    fn test_classifier_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Classifier>();
    }
}
