use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::labels::DEFAULT_LABEL_CANDIDATES;
use crate::data::roles::RoleConfig;

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Where to read from and write to.  Every field has a default, so a config
/// file only needs the values it changes:
///
/// ```json
/// { "input": "data/raw/train.csv", "roles": { "target_names": ["is_default"] } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Training table.
    pub input: PathBuf,
    /// Directory searched for a labels file; defaults to the input's directory.
    pub external_dir: Option<PathBuf>,
    /// Explicit labels file.  Skips discovery; must exist.
    pub label_file: Option<PathBuf>,
    /// File names tried in `external_dir`, in order.
    pub label_candidates: Vec<String>,
    pub output_dir: PathBuf,
    pub roles: RoleConfig,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/external/train.parquet"),
            external_dir: None,
            label_file: None,
            label_candidates: DEFAULT_LABEL_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output_dir: PathBuf::from("data/processed"),
            roles: RoleConfig::default(),
        }
    }
}

impl PrepConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn external_dir(&self) -> PathBuf {
        match &self.external_dir {
            Some(dir) => dir.clone(),
            None => self
                .input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}
