use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, info};

use super::loader::load_table;
use super::model::{Column, Table};
use super::roles::RoleConfig;
use crate::error::PrepError;

/// File names tried, in order, when looking for a separate labels file.
pub const DEFAULT_LABEL_CANDIDATES: &[&str] = &[
    "train_labels.csv",
    "train_labels.parquet",
    "labels.csv",
    "labels.parquet",
];

/// Return the first candidate that exists in `dir`.
pub fn discover_label_file<S: AsRef<str>>(dir: &Path, candidates: &[S]) -> Option<PathBuf> {
    let found = candidates
        .iter()
        .map(|name| dir.join(name.as_ref()))
        .find(|path| path.is_file());
    match &found {
        Some(path) => info!("found separate labels file: {}", path.display()),
        None => debug!("no labels file in {}", dir.display()),
    }
    found
}

// ---------------------------------------------------------------------------
// LabelSource – a second table supplying the target
// ---------------------------------------------------------------------------

/// A loaded labels file with its label and identifier columns located.
#[derive(Debug, Clone)]
pub struct LabelSource {
    pub path: PathBuf,
    pub table: Table,
    pub target_column: String,
    pub identifier_column: Option<String>,
}

impl LabelSource {
    /// Load a labels file.  Failure to load is fatal to the run.
    pub fn load(path: &Path, config: &RoleConfig) -> Result<Self> {
        let table = load_table(path)?;
        Ok(Self::from_table(path, table, config)?)
    }

    /// Locate the label column in an already-loaded table.
    ///
    /// The label column is the first configured target name present; otherwise
    /// the first column after the identifier, otherwise the first column.
    pub fn from_table(path: &Path, table: Table, config: &RoleConfig) -> Result<Self, PrepError> {
        let identifier_column = config.find_identifier(&table.columns).cloned();

        let named = config.find_target(&table.columns);
        let fallback = || match &identifier_column {
            Some(id) => table.columns.iter().find(|c| *c != id),
            None => table.columns.first(),
        };

        let target_column = named
            .or_else(fallback)
            .cloned()
            .ok_or_else(|| PrepError::NoLabelColumn {
                path: path.to_path_buf(),
            })?;

        info!(
            "label column '{target_column}' ({} rows, identifier: {})",
            table.len(),
            identifier_column.as_deref().unwrap_or("none")
        );

        Ok(LabelSource {
            path: path.to_path_buf(),
            table,
            target_column,
            identifier_column,
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The label column in file order.
    pub fn labels(&self) -> Column {
        // target_column was taken from table.columns
        self.table
            .column(&self.target_column)
            .unwrap_or_else(|| Column::new(self.target_column.clone(), Vec::new()))
    }

    pub fn identifiers(&self) -> Option<Column> {
        self.identifier_column
            .as_deref()
            .and_then(|id| self.table.column(id))
    }
}
