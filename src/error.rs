use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Fatal errors
// ---------------------------------------------------------------------------

/// Conditions that abort a run.  Everything recoverable is reported as a
/// [`Diagnostic`] instead.
#[derive(Debug, Error)]
pub enum PrepError {
    /// A required input file (training table or declared label file) is absent.
    #[error("input not found: {}", path.display())]
    MissingInput { path: PathBuf },

    /// The label file has no column that could hold the target.
    #[error("no label column found in {}", path.display())]
    NoLabelColumn { path: PathBuf },

    /// Positional merge requested but the two sources disagree on row count.
    #[error("cannot align labels by position: table has {table_rows} rows, label source has {label_rows}")]
    RowCountMismatch { table_rows: usize, label_rows: usize },

    /// A row whose width differs from the header.
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),
}

// ---------------------------------------------------------------------------
// Non-fatal conditions
// ---------------------------------------------------------------------------

/// A recoverable condition raised while resolving or splitting.  The run
/// continues; the caller receives the full list in the run report.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Binary-column heuristic found zero or several candidates.
    AmbiguousTarget { candidates: Vec<String> },
    /// External labels were merged row-for-row with no identifier to join on.
    UnalignedLabels,
    /// Some table identifiers have no entry in the label source.
    UnmatchedIdentifiers { count: usize },
    /// The resolved target holds values outside {0, 1}.
    NonBinaryTarget { column: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::AmbiguousTarget { candidates } if candidates.is_empty() => {
                write!(f, "no target column could be identified; processing features only")
            }
            Diagnostic::AmbiguousTarget { candidates } => write!(
                f,
                "{} binary columns look like targets ({}); processing features only",
                candidates.len(),
                candidates.join(", ")
            ),
            Diagnostic::UnalignedLabels => write!(
                f,
                "no identifier available; labels merged by row position, order is not verified"
            ),
            Diagnostic::UnmatchedIdentifiers { count } => {
                write!(f, "{count} identifiers have no label; their target is missing")
            }
            Diagnostic::NonBinaryTarget { column } => {
                write!(f, "target column '{column}' is not binary (0/1)")
            }
        }
    }
}

impl Diagnostic {
    /// Log the diagnostic at warn level and hand it back.
    pub fn raise(self) -> Self {
        log::warn!("{self}");
        self
    }
}
