use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use super::model::{Column, Table, Value};

// ---------------------------------------------------------------------------
// Arrow conversion
// ---------------------------------------------------------------------------

/// Pick the narrowest Arrow type holding every non-null value of a column.
/// Integers mixed with floats widen to Float64; any other mix falls back to text.
fn infer_type<'a>(values: impl Iterator<Item = &'a Value>) -> DataType {
    let mut ty: Option<DataType> = None;
    for v in values {
        let this = match v {
            Value::Null => continue,
            Value::Integer(_) => DataType::Int64,
            Value::Float(_) => DataType::Float64,
            Value::Bool(_) => DataType::Boolean,
            Value::String(_) => DataType::Utf8,
        };
        ty = Some(match ty {
            None => this,
            Some(prev) if prev == this => prev,
            Some(DataType::Int64) if this == DataType::Float64 => DataType::Float64,
            Some(DataType::Float64) if this == DataType::Int64 => DataType::Float64,
            Some(_) => DataType::Utf8,
        });
    }
    ty.unwrap_or(DataType::Utf8)
}

fn build_array(ty: &DataType, values: &[&Value]) -> ArrayRef {
    match ty {
        DataType::Int64 => Arc::new(Int64Array::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            values.iter().map(|v| v.as_f64()).collect::<Vec<_>>(),
        )),
        DataType::Boolean => Arc::new(BooleanArray::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect::<Vec<_>>(),
        )),
    }
}

/// Convert a whole table into a single record batch, column order preserved.
/// The table needs at least one column.
pub fn table_to_batch(table: &Table) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.width());
    let mut arrays = Vec::with_capacity(table.width());

    for (idx, name) in table.columns.iter().enumerate() {
        let values: Vec<&Value> = table.rows.iter().map(|r| &r[idx]).collect();
        let ty = infer_type(values.iter().copied());
        arrays.push(build_array(&ty, &values));
        fields.push(Field::new(name, ty, true));
    }

    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, arrays).context("building record batch")
}

pub fn column_to_batch(column: &Column) -> Result<RecordBatch> {
    let values: Vec<&Value> = column.values.iter().collect();
    let ty = infer_type(values.iter().copied());
    let array = build_array(&ty, &values);
    let schema = Arc::new(Schema::new(vec![Field::new(&column.name, ty, true)]));
    RecordBatch::try_new(schema, vec![array]).context("building record batch")
}

// ---------------------------------------------------------------------------
// Parquet output
// ---------------------------------------------------------------------------

fn write_batch(batch: &RecordBatch, path: &Path) -> Result<()> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating parquet writer")?;
    writer.write(batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Persist a table as a single-batch Snappy-compressed Parquet file.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let batch = table_to_batch(table)?;
    write_batch(&batch, path)?;
    info!(
        "wrote {} ({} rows x {} columns)",
        path.display(),
        table.len(),
        table.width()
    );
    Ok(())
}

/// Persist one sequence as a single-column Parquet file.
pub fn write_column(column: &Column, path: &Path) -> Result<()> {
    let batch = column_to_batch(column)?;
    write_batch(&batch, path)?;
    info!("wrote {} ({} rows)", path.display(), column.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_table;

    #[test]
    fn mixed_numeric_widens_to_float() {
        let vals = [Value::Integer(1), Value::Null, Value::Float(0.5)];
        assert_eq!(infer_type(vals.iter()), DataType::Float64);
        let vals = [Value::Integer(1), Value::String("x".into())];
        assert_eq!(infer_type(vals.iter()), DataType::Utf8);
        assert_eq!(infer_type([Value::Null].iter()), DataType::Utf8);
    }

    #[test]
    fn table_survives_parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X_train.parquet");
        let table = Table::new(
            vec!["P_2".into(), "B_1".into(), "S_3".into()],
            vec![
                vec![Value::Float(0.9), Value::Integer(3), Value::String("x".into())],
                vec![Value::Null, Value::Integer(4), Value::Null],
            ],
        )
        .unwrap();

        write_table(&table, &path).unwrap();
        let back = load_table(&path).unwrap();
        assert_eq!(back, table);
    }
}
