use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use log::{debug, info, warn};

use crate::config::PrepConfig;
use crate::data::labels::{LabelSource, discover_label_file};
use crate::data::loader::load_table;
use crate::data::roles::resolve;
use crate::data::split::{SplitOutput, split};
use crate::data::writer::{table_to_batch, write_column, write_table};
use crate::error::{Diagnostic, PrepError};

pub const FEATURES_FILE: &str = "X_train.parquet";
pub const TARGET_FILE: &str = "y_train.parquet";
pub const IDENTIFIER_FILE: &str = "customer_ids.parquet";

const PREVIEW_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Shape and class balance of what was written.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSummary {
    pub rows: usize,
    pub feature_columns: usize,
    /// (class, count, proportion of labelled rows), sorted by class.
    pub class_distribution: Vec<(String, usize, f64)>,
    /// Rows whose target is missing.
    pub missing_targets: usize,
    pub unique_identifiers: Option<usize>,
}

impl DataSummary {
    pub fn from_output(output: &SplitOutput) -> Self {
        let (class_distribution, missing_targets) = match &output.target {
            Some(t) => {
                let counts = t.value_counts();
                let labelled: usize = counts.values().sum();
                let dist = counts
                    .into_iter()
                    .map(|(v, n)| (v.to_string(), n, n as f64 / labelled.max(1) as f64))
                    .collect();
                (dist, t.len() - labelled)
            }
            None => (Vec::new(), 0),
        };
        let unique_identifiers = output
            .identifier
            .as_ref()
            .map(|ids| ids.values.iter().collect::<BTreeSet<_>>().len());

        DataSummary {
            rows: output.features.len(),
            feature_columns: output.features.width(),
            class_distribution,
            missing_targets,
            unique_identifiers,
        }
    }

    fn log(&self) {
        info!("features: {} rows x {} columns", self.rows, self.feature_columns);
        if self.class_distribution.is_empty() && self.missing_targets == 0 {
            info!("labels: not available");
        }
        for (class, n, p) in &self.class_distribution {
            info!("label {class}: {n} ({:.2}%)", p * 100.0);
        }
        if self.missing_targets > 0 {
            info!("label missing: {}", self.missing_targets);
        }
        if let Some(unique) = self.unique_identifiers {
            info!("identifiers: {} rows, {unique} unique", self.rows);
        }
    }
}

/// Everything a caller needs to know about a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub features_path: Option<PathBuf>,
    pub target_path: Option<PathBuf>,
    pub identifier_path: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: DataSummary,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Load, resolve, split and persist.  Only a missing or unreadable input
/// aborts; every other condition ends up in `RunReport::diagnostics`.
pub fn run(config: &PrepConfig) -> Result<RunReport> {
    if !config.input.is_file() {
        return Err(PrepError::MissingInput {
            path: config.input.clone(),
        }
        .into());
    }
    let table = load_table(&config.input)?;

    let label_path = match &config.label_file {
        Some(path) => Some(path.clone()),
        None => discover_label_file(&config.external_dir(), &config.label_candidates),
    };
    let labels = label_path
        .as_deref()
        .map(|p| LabelSource::load(p, &config.roles))
        .transpose()
        .context("loading labels file")?;

    let resolution = resolve(&table, labels.as_ref(), &config.roles);
    let output = split(&table, &resolution, labels.as_ref())?;

    let mut diagnostics = resolution.diagnostics.clone();
    diagnostics.extend(output.diagnostics.iter().cloned());

    let summary = DataSummary::from_output(&output);
    summary.log();
    if log::log_enabled!(log::Level::Debug) && output.features.width() > 0 {
        let head = table_to_batch(&output.features)?;
        let preview = head.slice(0, PREVIEW_ROWS.min(head.num_rows()));
        debug!("features preview:\n{}", pretty_format_batches(&[preview])?);
    }

    let (features_path, target_path, identifier_path) = persist(config, &output)?;

    Ok(RunReport {
        features_path,
        target_path,
        identifier_path,
        diagnostics,
        summary,
    })
}

type Written = (Option<PathBuf>, Option<PathBuf>, Option<PathBuf>);

/// Write each present output; absent outputs leave no file behind.
fn persist(config: &PrepConfig, output: &SplitOutput) -> Result<Written> {
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    info!("saving processed data to {}", config.output_dir.display());

    let features_path = if output.features.width() > 0 {
        let path = config.output_dir.join(FEATURES_FILE);
        write_table(&output.features, &path)?;
        Some(path)
    } else {
        warn!("no feature columns left; features file not written");
        None
    };

    let target_path = match &output.target {
        Some(target) => {
            let path = config.output_dir.join(TARGET_FILE);
            write_column(target, &path)?;
            Some(path)
        }
        None => {
            info!("no labels to save");
            None
        }
    };

    let identifier_path = match &output.identifier {
        Some(ids) => {
            let path = config.output_dir.join(IDENTIFIER_FILE);
            write_column(ids, &path)?;
            Some(path)
        }
        None => None,
    };

    Ok((features_path, target_path, identifier_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, Table, Value};

    #[test]
    fn summary_counts_classes_and_missing_labels() {
        let features = Table::new(vec!["D_1".into()], vec![vec![Value::Integer(0)]; 4]).unwrap();
        let output = SplitOutput {
            features,
            target: Some(Column::new(
                "target",
                vec![Value::Integer(1), Value::Integer(0), Value::Integer(0), Value::Null],
            )),
            identifier: Some(Column::new(
                "customer_ID",
                ["a", "b", "b", "c"].iter().map(|s| Value::String(s.to_string())).collect(),
            )),
            strategy: None,
            diagnostics: Vec::new(),
        };

        let summary = DataSummary::from_output(&output);
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.missing_targets, 1);
        assert_eq!(summary.unique_identifiers, Some(3));
        assert_eq!(summary.class_distribution.len(), 2);
        let (class, n, p) = &summary.class_distribution[0];
        assert_eq!((class.as_str(), *n), ("0", 2));
        assert!((p - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn missing_input_aborts_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = PrepConfig {
            input: dir.path().join("train.parquet"),
            output_dir: dir.path().join("processed"),
            ..PrepConfig::default()
        };
        let err = run(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PrepError>(),
            Some(PrepError::MissingInput { .. })
        ));
        assert!(!config.output_dir.exists());
    }
}
