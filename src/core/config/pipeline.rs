//! Top-level configuration for model resolution and classification.

use super::{ConfigError, ConfigValidator, InputSize, OrtSessionConfig};
use crate::core::constants::DEFAULT_MODEL_DIR;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable naming the directory searched for models and labels.
pub const ENV_MODEL_DIR: &str = "MODEL_DIR";
/// Environment variable overriding the model artifact path.
pub const ENV_MODEL_PATH: &str = "MODEL_PATH";
/// Environment variable overriding the input size, as `"height,width"`.
pub const ENV_MODEL_INPUT_SIZE: &str = "MODEL_INPUT_SIZE";
/// Environment variable holding a comma-separated label list.
pub const ENV_MODEL_LABELS: &str = "MODEL_LABELS";
/// Environment variable enabling the development stub when set to `1`.
pub const ENV_ALLOW_STUB: &str = "ALLOW_STUB";

/// Configuration consumed by [`ModelResolver`](crate::pipeline::ModelResolver).
///
/// # Examples
///
/// ```rust
/// use mediconnect_ml::core::config::{InputSize, PipelineConfig};
///
/// let config = PipelineConfig::new()
///     .with_model_dir("/srv/models")
///     .with_input_size(InputSize::new(256, 256))
///     .with_labels(["benign", "malignant"]);
///
/// assert!(!config.allow_stub);
/// assert_eq!(config.labels.as_deref().map(|l| l.len()), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory searched for model artifacts and `labels.txt`.
    pub model_dir: PathBuf,
    /// Explicit model artifact, checked before the model directory.
    pub model_path: Option<PathBuf>,
    /// Explicit input size; wins over shape discovery.
    pub input_size: Option<InputSize>,
    /// Explicit label list; wins over any label file.
    pub labels: Option<Vec<String>>,
    /// Enables the deterministic development stub when no model loads.
    pub allow_stub: bool,
    /// ONNX Runtime session settings for graph-execution models.
    pub ort_session: Option<OrtSessionConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            model_path: None,
            input_size: None,
            labels: None,
            allow_stub: false,
            ort_session: None,
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from the process environment.
    ///
    /// Recognized variables are `MODEL_DIR`, `MODEL_PATH`, `MODEL_INPUT_SIZE`,
    /// `MODEL_LABELS` and `ALLOW_STUB`. Empty values count as unset. An unparseable
    /// input size is logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(dir) = get(ENV_MODEL_DIR) {
            config.model_dir = PathBuf::from(dir);
        }
        config.model_path = get(ENV_MODEL_PATH).map(PathBuf::from);
        config.input_size = get(ENV_MODEL_INPUT_SIZE).and_then(|value| {
            value
                .parse::<InputSize>()
                .inspect_err(|e| warn!("Ignoring {}: {}", ENV_MODEL_INPUT_SIZE, e))
                .ok()
        });
        config.labels = get(ENV_MODEL_LABELS).map(|value| parse_label_list(&value));
        config.allow_stub = get(ENV_ALLOW_STUB).as_deref() == Some("1");
        config
    }

    /// Loads a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Sets the model directory.
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    /// Sets an explicit model path.
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Sets an explicit input size.
    pub fn with_input_size(mut self, size: InputSize) -> Self {
        self.input_size = Some(size);
        self
    }

    /// Sets an explicit label list.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Enables or disables the development stub.
    pub fn with_allow_stub(mut self, allow: bool) -> Self {
        self.allow_stub = allow;
        self
    }

    /// Sets the ONNX Runtime session configuration.
    pub fn with_ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.ort_session = Some(config);
        self
    }
}

/// Splits a comma-separated label list, trimming entries and dropping empty ones.
pub fn parse_label_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ConfigValidator for PipelineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(size) = self.input_size
            && !size.is_valid()
        {
            return Err(ConfigError::InvalidInputSize {
                value: format!("{},{}", size.height, size.width),
            });
        }

        if let Some(labels) = &self.labels
            && labels.iter().any(|l| l.trim().is_empty())
        {
            return Err(ConfigError::InvalidConfig {
                message: "label entries must not be empty".to_string(),
            });
        }

        if let Some(ort) = &self.ort_session {
            self.validate_thread_count("intra_threads", ort.intra_threads)?;
            self.validate_thread_count("inter_threads", ort.inter_threads)?;
        }

        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}
