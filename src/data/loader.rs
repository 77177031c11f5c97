use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int8Array, Int16Array,
    Int32Array, Int64Array, StringArray, UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Table, Value};
use crate::error::PrepError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a whole table into memory.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – any flat schema (ints, floats, bools, strings)
/// * `.csv`     – header row, cell types inferred per value
/// * `.json`    – `[{ "col": value, ... }, ...]`
///
/// A missing file is reported as [`PrepError::MissingInput`] before any parsing.
pub fn load_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(PrepError::MissingInput {
            path: path.to_path_buf(),
        }
        .into());
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    info!("loading table from {}", path.display());
    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!("loaded {} rows x {} columns", table.len(), table.width());
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "customer_ID": "a1", "D_39": 0.12, "target": 0 },
///   ...
/// ]
/// ```
///
/// Column order is the first-seen key order; keys missing from a record are null.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|c| obj.get(c).map(json_to_value).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok(Table::new(columns, rows)?)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
///
/// Like `pandas.read_csv`, each column gets one type for all of its cells, so
/// `0`, `1` and `1.0` in one column all read as floats.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        records.push(result.with_context(|| format!("CSV row {row_no}"))?);
    }

    let kinds: Vec<CellKind> = (0..columns.len())
        .map(|idx| column_kind(records.iter().map(|r| r.get(idx).unwrap_or(""))))
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            kinds
                .iter()
                .enumerate()
                .map(|(idx, kind)| kind.parse(record.get(idx).unwrap_or("")))
                .collect()
        })
        .collect();

    Ok(Table::new(columns, rows)?)
}

/// Type shared by every non-empty cell of a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Integer,
    Float,
    Bool,
    Text,
}

impl CellKind {
    fn of(s: &str) -> Self {
        let digits = s.strip_prefix('-').unwrap_or(s);
        // Zero-padded codes such as `007` are identifiers, not numbers.
        let zero_padded = digits.len() > 1
            && digits.starts_with('0')
            && digits.bytes().all(|b| b.is_ascii_digit());
        if zero_padded {
            CellKind::Text
        } else if s.parse::<i64>().is_ok() {
            CellKind::Integer
        } else if s.parse::<f64>().is_ok() {
            CellKind::Float
        } else if s == "true" || s == "false" {
            CellKind::Bool
        } else {
            CellKind::Text
        }
    }

    fn widen(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (CellKind::Integer, CellKind::Float) | (CellKind::Float, CellKind::Integer) => {
                CellKind::Float
            }
            _ => CellKind::Text,
        }
    }

    fn parse(self, s: &str) -> Value {
        if s.is_empty() {
            return Value::Null;
        }
        match self {
            CellKind::Integer => s.parse().map(Value::Integer).unwrap_or(Value::Null),
            CellKind::Float => s.parse().map(Value::Float).unwrap_or(Value::Null),
            CellKind::Bool => Value::Bool(s == "true"),
            CellKind::Text => Value::String(s.to_string()),
        }
    }
}

/// An all-empty column reads as text (every cell null).
fn column_kind<'a>(cells: impl Iterator<Item = &'a str>) -> CellKind {
    cells
        .filter(|s| !s.is_empty())
        .map(CellKind::of)
        .reduce(CellKind::widen)
        .unwrap_or(CellKind::Text)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file.  Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`); record batches
/// are concatenated in file order.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for (batch_no, batch_result) in reader.enumerate() {
        let batch = batch_result.context("reading parquet record batch")?;
        debug!("batch {batch_no}: {} rows", batch.num_rows());

        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .map(|col| extract_value(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row} of batch {batch_no}"))?;
            rows.push(values);
        }
    }

    Ok(Table::new(columns, rows)?)
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }

    fn downcast<'a, T: 'static>(col: &'a Arc<dyn Array>) -> Result<&'a T> {
        col.as_any()
            .downcast_ref::<T>()
            .with_context(|| format!("unexpected array type for {:?}", col.data_type()))
    }

    let value = match col.data_type() {
        DataType::Utf8 => Value::String(downcast::<StringArray>(col)?.value(row).to_string()),
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => Value::Integer(downcast::<Int8Array>(col)?.value(row) as i64),
        DataType::Int16 => Value::Integer(downcast::<Int16Array>(col)?.value(row) as i64),
        DataType::Int32 => Value::Integer(downcast::<Int32Array>(col)?.value(row) as i64),
        DataType::Int64 => Value::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::UInt8 => Value::Integer(downcast::<UInt8Array>(col)?.value(row) as i64),
        DataType::UInt16 => Value::Integer(downcast::<UInt16Array>(col)?.value(row) as i64),
        DataType::UInt32 => Value::Integer(downcast::<UInt32Array>(col)?.value(row) as i64),
        DataType::Float32 => Value::Float(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => Value::Float(downcast::<Float64Array>(col)?.value(row)),
        DataType::UInt64 => {
            let v = downcast::<UInt64Array>(col)?.value(row);
            i64::try_from(v).map_or_else(|_| Value::String(v.to_string()), Value::Integer)
        }
        DataType::Boolean => Value::Bool(downcast::<BooleanArray>(col)?.value(row)),
        // Dates, timestamps, categoricals and the rest keep their display text.
        _ => Value::String(array_value_to_string(col, row).context("formatting cell")?),
    };
    Ok(value)
}
