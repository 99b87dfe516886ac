//! Class labels and where they came from.

use crate::core::constants::{DEFAULT_LABELS, HEALTH_LABEL_PREVIEW};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Origin of a [`LabelSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    /// Supplied through configuration.
    Explicit,
    /// Read from a label file.
    File(PathBuf),
    /// The built-in placeholder labels.
    Default,
}

/// Ordered class names, where the index of a name is its class index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
    source: LabelSource,
}

impl LabelSet {
    /// Creates a label set from an explicit list.
    pub fn explicit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            source: LabelSource::Explicit,
        }
    }

    /// Reads a label file: UTF-8, one label per line, lines trimmed, blank lines dropped.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let labels = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self {
            labels,
            source: LabelSource::File(path.to_path_buf()),
        })
    }

    /// Returns the label at `index`, or `class_<index>` when out of range.
    pub fn get(&self, index: usize) -> String {
        self.labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("class_{index}"))
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true when there are no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The labels in class-index order.
    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    /// Where the labels came from.
    pub fn source(&self) -> &LabelSource {
        &self.source
    }

    /// Returns the first few labels, followed by `"..."` when more exist.
    pub fn preview(&self) -> Vec<String> {
        let mut preview: Vec<String> = self
            .labels
            .iter()
            .take(HEALTH_LABEL_PREVIEW)
            .cloned()
            .collect();
        if self.labels.len() > HEALTH_LABEL_PREVIEW {
            preview.push("...".to_string());
        }
        preview
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
            source: LabelSource::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_out_of_range_index_gets_placeholder() {
        let labels = LabelSet::explicit(["cat", "dog"]);
        assert_eq!(labels.get(1), "dog");
        assert_eq!(labels.get(7), "class_7");
    }

    #[test]
    fn test_from_file_trims_and_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  benign \n\n malignant\r\n   \nunknown").unwrap();

        let labels = LabelSet::from_file(file.path()).unwrap();
        assert_eq!(labels.as_slice(), &["benign", "malignant", "unknown"]);
        assert_eq!(labels.source(), &LabelSource::File(file.path().to_path_buf()));
    }

    #[test]
    fn test_default_labels() {
        let labels = LabelSet::default();
        assert_eq!(labels.as_slice(), &["classA", "classB", "classC"]);
        assert_eq!(labels.source(), &LabelSource::Default);
    }

    #[test]
    fn test_preview_truncates() {
        let short = LabelSet::explicit(["a", "b"]);
        assert_eq!(short.preview(), vec!["a", "b"]);

        let long = LabelSet::explicit(["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(long.preview(), vec!["a", "b", "c", "d", "e", "..."]);
    }
}
