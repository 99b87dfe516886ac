//! Locating, loading and configuring the model at startup.
//!
//! Resolution never fails. Load errors are logged, kept in [`Resolution::failure`] and the
//! pipeline degrades to [`PipelineState::Unloaded`] (or [`PipelineState::StubEnabled`] when
//! the stub is allowed).

use super::state::{PipelineState, RuntimeHandle};
use crate::core::config::{InputSize, PipelineConfig, negotiate_input_size};
use crate::core::constants::{CONVENTIONAL_MODEL_NAMES, LABEL_FILE_NAME};
use crate::core::errors::InferenceError;
use crate::core::traits::LoadOptions;
use crate::domain::{LabelSet, ModelArtifact, ModelKind};
use crate::models::load_runtime;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything the classifier needs, produced once by [`ModelResolver::resolve`].
#[derive(Debug)]
pub struct Resolution {
    /// What the classifier can do.
    pub state: PipelineState,
    /// Class labels.
    pub labels: LabelSet,
    /// Spatial size images are resized to.
    pub input_size: InputSize,
    /// Why a located model could not be loaded, if one was found and failed.
    pub failure: Option<InferenceError>,
}

/// Resolves the model artifact, label set and input size from a [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct ModelResolver {
    config: PipelineConfig,
}

impl ModelResolver {
    /// Creates a resolver for `config`.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The configuration being resolved.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Finds the model artifact to load.
    ///
    /// Checks the explicit override, then the conventional names in the model directory, then
    /// the first directory entry (by name) whose kind is known. Hidden entries and label files
    /// are never picked by the fallback. A missing model directory is treated as empty.
    pub fn find_model_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config.model_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(
                "Model path override '{}' does not exist; searching '{}'",
                path.display(),
                self.config.model_dir.display()
            );
        }

        let dir = &self.config.model_dir;
        if let Some(found) = CONVENTIONAL_MODEL_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.exists())
        {
            return Some(found);
        }

        first_known_entry(dir)
    }

    /// Resolves state, labels and input size. Never fails.
    pub fn resolve(&self) -> Resolution {
        let override_size = self.config.input_size.filter(InputSize::is_valid);
        let artifact = self.find_model_path().map(ModelArtifact::new);

        let mut input_size = negotiate_input_size(override_size, None);
        let mut state = None;
        let mut failure = None;

        match &artifact {
            Some(artifact) => {
                info!(
                    "Found {} model artifact at '{}'",
                    artifact.kind,
                    artifact.path.display()
                );
                let options = LoadOptions {
                    input_size,
                    ort_session: self.config.ort_session.clone(),
                };
                match load_runtime(artifact, &options) {
                    Ok(runtime) => {
                        let spec = runtime.input_spec();
                        input_size = negotiate_input_size(override_size, spec.size);
                        let handle = RuntimeHandle::new(runtime, input_size);
                        info!(
                            "Loaded {} model '{}' ({} input {})",
                            handle.kind(),
                            handle.info().model_name,
                            handle.layout(),
                            input_size
                        );
                        state = Some(PipelineState::Loaded(handle));
                    }
                    Err(e) => {
                        warn!(
                            "Failed to load model '{}': {}",
                            artifact.path.display(),
                            e
                        );
                        failure = Some(e);
                    }
                }
            }
            None => info!("No model found in '{}'", self.config.model_dir.display()),
        }

        let state = state.unwrap_or_else(|| {
            if self.config.allow_stub {
                warn!("Development stub enabled: results are not model predictions");
                PipelineState::StubEnabled
            } else {
                PipelineState::Unloaded
            }
        });

        let labels = self.resolve_labels(artifact.as_ref());
        info!(
            "Using {} labels ({:?}) at input size {}",
            labels.len(),
            labels.source(),
            input_size
        );

        Resolution {
            state,
            labels,
            input_size,
            failure,
        }
    }

    /// Picks labels: explicit list, then `labels.txt` beside the artifact, then `labels.txt`
    /// in the model directory, then the defaults. Empty sources are skipped.
    pub fn resolve_labels(&self, artifact: Option<&ModelArtifact>) -> LabelSet {
        if let Some(labels) = &self.config.labels {
            let labels: Vec<&str> = labels
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .collect();
            if !labels.is_empty() {
                return LabelSet::explicit(labels);
            }
        }

        let mut candidates: Vec<PathBuf> = Vec::with_capacity(2);
        if let Some(dir) = artifact.and_then(ModelArtifact::sibling_dir) {
            candidates.push(dir.join(LABEL_FILE_NAME));
        }
        let dir_file = self.config.model_dir.join(LABEL_FILE_NAME);
        if !candidates.contains(&dir_file) {
            candidates.push(dir_file);
        }

        candidates
            .iter()
            .filter(|path| path.is_file())
            .find_map(|path| match LabelSet::from_file(path) {
                Ok(labels) if !labels.is_empty() => Some(labels),
                Ok(_) => {
                    debug!("Label file '{}' is empty", path.display());
                    None
                }
                Err(e) => {
                    warn!("Failed to read label file '{}': {}", path.display(), e);
                    None
                }
            })
            .unwrap_or_default()
    }
}

/// First entry of `dir` by file name whose model kind is known.
fn first_known_entry(dir: &Path) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list model directory '{}': {}", dir.display(), e);
            return None;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| !name.starts_with('.') && name != LABEL_FILE_NAME)
        })
        .collect();
    paths.sort();

    paths
        .into_iter()
        .find(|path| ModelKind::from_path(path).is_known())
}
