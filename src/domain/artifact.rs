//! Model artifacts and the runtime family each one belongs to.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime family of a model artifact, inferred from its path.
///
/// Serialized with the same short names as [`ModelKind::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Portable graph executed by ONNX Runtime (`.onnx`).
    #[serde(rename = "onnx")]
    GraphExecution,
    /// Traced TorchScript module (`.pt`, `.pth`).
    #[serde(rename = "torch")]
    TracedScript,
    /// TensorFlow graph (`.pb`, `.h5`, or a directory holding a `.pb` or a SavedModel).
    #[serde(rename = "tf")]
    FrozenGraph,
    /// Anything else.
    #[serde(rename = "unknown")]
    Unknown,
}

impl ModelKind {
    /// Detects the kind of the artifact at `path`.
    ///
    /// Extensions are matched case-insensitively. A directory is a frozen graph only when it
    /// directly contains a `.pb` file; any other directory is `Unknown`.
    pub fn from_path(path: &Path) -> Self {
        if path.is_dir() {
            return if contains_graph_file(path) {
                ModelKind::FrozenGraph
            } else {
                ModelKind::Unknown
            };
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("onnx") => ModelKind::GraphExecution,
            Some("pt" | "pth") => ModelKind::TracedScript,
            Some("pb" | "h5") => ModelKind::FrozenGraph,
            _ => ModelKind::Unknown,
        }
    }

    /// Returns true for every kind except `Unknown`.
    pub fn is_known(&self) -> bool {
        !matches!(self, ModelKind::Unknown)
    }

    /// Returns the lowercase name used in logs and health reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::GraphExecution => "onnx",
            ModelKind::TracedScript => "torch",
            ModelKind::FrozenGraph => "tf",
            ModelKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true when `dir` directly contains a file with a `.pb` extension.
pub(crate) fn contains_graph_file(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .any(|entry| is_graph_file(&entry.path()))
        })
        .unwrap_or(false)
}

pub(crate) fn is_graph_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pb"))
}

/// A located model artifact together with its detected kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifact {
    /// File or directory holding the model.
    pub path: PathBuf,
    /// Detected runtime family.
    pub kind: ModelKind,
}

impl ModelArtifact {
    /// Creates an artifact for `path`, detecting its kind.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = ModelKind::from_path(&path);
        Self { path, kind }
    }

    /// Directory where a `labels.txt` beside this artifact would live.
    ///
    /// That is the artifact itself for a directory, otherwise its parent.
    pub fn sibling_dir(&self) -> Option<&Path> {
        if self.path.is_dir() {
            Some(&self.path)
        } else {
            self.path.parent()
        }
    }

    /// Returns the file stem used as the model name.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model")
            .to_string()
    }
}
