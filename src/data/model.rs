use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::PrepError;

// ---------------------------------------------------------------------------
// Value – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// True for 0/1 encoded as integer, float or bool.
    pub fn is_binary(&self) -> bool {
        matches!(self.as_f64(), Some(v) if v == 0.0 || v == 1.0)
    }

    /// True for the values a label column may carry: 0, 1, or the -1 sentinel.
    pub fn is_label_like(&self) -> bool {
        matches!(self.as_f64(), Some(v) if v == 0.0 || v == 1.0 || v == -1.0)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Column – a named sequence of values
// ---------------------------------------------------------------------------

/// A single output sequence (target or identifier) in table row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Occurrences of each non-null value, sorted by value.
    pub fn value_counts(&self) -> BTreeMap<Value, usize> {
        let mut counts = BTreeMap::new();
        for v in self.values.iter().filter(|v| !v.is_null()) {
            *counts.entry(v.clone()).or_insert(0) += 1;
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// An immutable row-major table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Column names in file order.
    pub columns: Vec<String>,
    /// Rows, each `columns.len()` wide.
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table.  Every row must match the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, PrepError> {
        if let Some((row_no, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(PrepError::RaggedRow {
                row: row_no,
                expected: columns.len(),
                found: row.len(),
            });
        }
        Ok(Table { columns, rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Sorted distinct values of one column, nulls included.
    pub fn distinct(&self, name: &str) -> Option<BTreeSet<Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].clone()).collect())
    }

    /// Copy out one column in row order.
    pub fn column(&self, name: &str) -> Option<Column> {
        let idx = self.column_index(name)?;
        let values = self.rows.iter().map(|r| r[idx].clone()).collect();
        Some(Column::new(name, values))
    }

    /// A new table without the named columns; remaining column and row order kept.
    /// Names not present in the table are ignored.
    pub fn without_columns(&self, excluded: &[&str]) -> Table {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !excluded.contains(&c.as_str()))
            .map(|(i, _)| i)
            .collect();

        let columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Table { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["id".into(), "D_1".into(), "target".into()],
            vec![
                vec![Value::String("a".into()), Value::Float(0.5), Value::Integer(0)],
                vec![Value::String("b".into()), Value::Null, Value::Integer(1)],
                vec![Value::String("c".into()), Value::Float(0.5), Value::Integer(0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn distinct_values_include_nulls() {
        let t = sample();
        let d1 = t.distinct("D_1").unwrap();
        assert_eq!(d1.len(), 2);
        assert!(d1.contains(&Value::Null));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![Value::Integer(1)]],
        )
        .unwrap_err();
        assert!(matches!(err, PrepError::RaggedRow { row: 0, expected: 2, found: 1 }));
    }

    #[test]
    fn without_columns_keeps_order() {
        let t = sample().without_columns(&["id", "missing"]);
        assert_eq!(t.columns, vec!["D_1", "target"]);
        assert_eq!(t.len(), 3);
        assert_eq!(t.rows[1], vec![Value::Null, Value::Integer(1)]);
    }

    #[test]
    fn value_counts_skip_nulls() {
        let col = Column::new(
            "target",
            vec![Value::Integer(1), Value::Null, Value::Integer(1), Value::Integer(0)],
        );
        let counts = col.value_counts();
        assert_eq!(counts[&Value::Integer(1)], 2);
        assert_eq!(counts[&Value::Integer(0)], 1);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn binary_domain_accepts_float_and_bool() {
        assert!(Value::Float(1.0).is_binary());
        assert!(Value::Bool(false).is_binary());
        assert!(!Value::Integer(-1).is_binary());
        assert!(Value::Float(-1.0).is_label_like());
        assert!(!Value::String("1".into()).is_label_like());
    }
}
