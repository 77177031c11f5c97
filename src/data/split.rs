//! Split a table into row-aligned features, target and identifier outputs.
//!
//! Whatever the target source, the outputs always satisfy
//! `features.len() == target.len() == identifier.len()` for the sequences present.

use std::collections::HashMap;

use log::{debug, info};

use super::labels::LabelSource;
use super::model::{Column, Table, Value};
use super::roles::{Resolution, ResolvedTarget};
use crate::error::{Diagnostic, PrepError};

/// Name given to the target sequence in every output.
pub const TARGET_COLUMN: &str = "target";

// ---------------------------------------------------------------------------
// Merge strategy for external labels
// ---------------------------------------------------------------------------

/// How an external label source is lined up with the table's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Look up each table row's identifier in the label source.
    JoinByIdentifier,
    /// Take labels row-for-row; assumes both sources share one row order.
    PositionalAssumeSameOrder,
}

impl MergeStrategy {
    /// Join when both sides carry the table's identifier column, positional otherwise.
    pub fn select(table_identifier: Option<&str>, labels: &LabelSource) -> Self {
        match table_identifier {
            Some(id) if labels.table.has_column(id) => MergeStrategy::JoinByIdentifier,
            _ => MergeStrategy::PositionalAssumeSameOrder,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub features: Table,
    pub target: Option<Column>,
    pub identifier: Option<Column>,
    /// Set only when the target came from an external source.
    pub strategy: Option<MergeStrategy>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SplitOutput {
    /// Check the row-alignment guarantee.
    pub fn is_aligned(&self) -> bool {
        let n = self.features.len();
        self.target.as_ref().map_or(true, |t| t.len() == n)
            && self.identifier.as_ref().map_or(true, |i| i.len() == n)
    }
}

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

/// Split `table` according to `resolution`.  `external` must be the source
/// the resolution points at when the target is external.
pub fn split(
    table: &Table,
    resolution: &Resolution,
    external: Option<&LabelSource>,
) -> Result<SplitOutput, PrepError> {
    let identifier = resolution.identifier.as_deref();
    let strategy = match (&resolution.target, external) {
        (ResolvedTarget::External(_), Some(labels)) => {
            Some(MergeStrategy::select(identifier, labels))
        }
        _ => None,
    };
    split_with_strategy(table, resolution, external, strategy)
}

/// Like [`split`], with the external merge strategy chosen by the caller.
pub fn split_with_strategy(
    table: &Table,
    resolution: &Resolution,
    external: Option<&LabelSource>,
    strategy: Option<MergeStrategy>,
) -> Result<SplitOutput, PrepError> {
    let id_col = resolution.identifier.as_deref();
    let mut diagnostics = Vec::new();

    let identifier = match id_col {
        Some(id) => Some(
            table
                .column(id)
                .ok_or_else(|| PrepError::UnknownColumn(id.to_string()))?,
        ),
        None => None,
    };

    let (target, features, strategy) = match (&resolution.target, external) {
        (ResolvedTarget::Inline(col), _) => {
            let values = table
                .column(col)
                .ok_or_else(|| PrepError::UnknownColumn(col.clone()))?
                .values;
            let mut excluded = vec![col.as_str()];
            excluded.extend(id_col);
            debug!("inline target '{col}', dropping {excluded:?} from features");
            (Some(Column::new(TARGET_COLUMN, values)), table.without_columns(&excluded), None)
        }
        (ResolvedTarget::External(_), Some(labels)) => {
            let strategy = strategy.unwrap_or_else(|| MergeStrategy::select(id_col, labels));
            let values = match (strategy, id_col) {
                (MergeStrategy::JoinByIdentifier, Some(id)) => {
                    join_by_identifier(table, id, labels, &mut diagnostics)?
                }
                _ => positional(table, labels, &mut diagnostics)?,
            };
            let excluded: Vec<&str> = id_col.into_iter().collect();
            (
                Some(Column::new(TARGET_COLUMN, values)),
                table.without_columns(&excluded),
                Some(strategy),
            )
        }
        (ResolvedTarget::External(path), None) => {
            return Err(PrepError::MissingInput { path: path.clone() });
        }
        (ResolvedTarget::Absent, _) => {
            info!("no target; processing features only");
            let excluded: Vec<&str> = id_col.into_iter().collect();
            (None, table.without_columns(&excluded), None)
        }
    };

    if let Some(t) = &target {
        let source = match &resolution.target {
            ResolvedTarget::Inline(col) => col.clone(),
            _ => external.map(|l| l.target_column.clone()).unwrap_or_default(),
        };
        if !t.values.iter().filter(|v| !v.is_null()).all(Value::is_binary) {
            diagnostics.push(Diagnostic::NonBinaryTarget { column: source }.raise());
        }
    }

    let output = SplitOutput {
        features,
        target,
        identifier,
        strategy,
        diagnostics,
    };
    debug_assert!(output.is_aligned());
    Ok(output)
}

/// Target for each table row, looked up by identifier.  Rows whose
/// identifier is null or missing from the labels get `Null`.  If the label
/// source repeats an identifier, its last row wins.
fn join_by_identifier(
    table: &Table,
    id_col: &str,
    labels: &LabelSource,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<Value>, PrepError> {
    let label_ids = labels
        .table
        .column(id_col)
        .ok_or_else(|| PrepError::UnknownColumn(id_col.to_string()))?;
    let label_values = labels.labels();

    // Keys compare by text so a numeric id read from CSV still matches the
    // same id stored as a string column in Parquet.
    let lookup: HashMap<String, &Value> = label_ids
        .values
        .iter()
        .zip(label_values.values.iter())
        .filter(|(id, _)| !id.is_null())
        .map(|(id, v)| (id.to_string(), v))
        .collect();

    let idx = table
        .column_index(id_col)
        .ok_or_else(|| PrepError::UnknownColumn(id_col.to_string()))?;

    let mut unmatched = 0;
    let values = table
        .rows
        .iter()
        .map(|row| {
            let found = (!row[idx].is_null())
                .then(|| lookup.get(&row[idx].to_string()))
                .flatten();
            match found {
                Some(v) => (*v).clone(),
                None => {
                    unmatched += 1;
                    Value::Null
                }
            }
        })
        .collect();

    info!("joined labels on '{id_col}' ({} label rows)", labels.len());
    if unmatched > 0 {
        diagnostics.push(Diagnostic::UnmatchedIdentifiers { count: unmatched }.raise());
    }
    Ok(values)
}

/// Labels taken row-for-row.  Row counts must agree; order cannot be checked.
fn positional(
    table: &Table,
    labels: &LabelSource,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<Value>, PrepError> {
    if labels.len() != table.len() {
        return Err(PrepError::RowCountMismatch {
            table_rows: table.len(),
            label_rows: labels.len(),
        });
    }
    diagnostics.push(Diagnostic::UnalignedLabels.raise());
    Ok(labels.labels().values)
}
