use super::aggregate::MissingCell;
use super::selector::LabelPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub results_dir: PathBuf,
    /// Glob relative to `results_dir`.
    pub pattern: String,
    pub output_dir: PathBuf,
    pub raw_file: String,
    pub normalized_file: String,
    /// The UE whose handover target is labeled.
    pub node_id: u32,
    pub label_policy: LabelPolicy,
    pub missing_cell: MissingCell,
    pub histogram_bins: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results-train"),
            pattern: "scenario=*/start-config=*/run-id=*/run=0/oran-repository.db".to_string(),
            output_dir: PathBuf::from("."),
            raw_file: "training-no-norm.data".to_string(),
            normalized_file: "training.data".to_string(),
            node_id: 1,
            label_policy: LabelPolicy::default(),
            missing_cell: MissingCell::default(),
            histogram_bins: 20,
        }
    }
}

impl DatasetConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_label_policy(mut self, policy: LabelPolicy) -> Self {
        self.label_policy = policy;
        self
    }

    pub fn with_missing_cell(mut self, missing: MissingCell) -> Self {
        self.missing_cell = missing;
        self
    }

    pub fn glob_pattern(&self) -> String {
        self.results_dir.join(&self.pattern).to_string_lossy().into_owned()
    }

    pub fn raw_path(&self) -> PathBuf {
        self.output_dir.join(&self.raw_file)
    }

    pub fn normalized_path(&self) -> PathBuf {
        self.output_dir.join(&self.normalized_file)
    }
}
