use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, MetricsTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a metrics table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row + one row per epoch (any unknown extension is read as CSV too)
/// * `.parquet` – one column per metric
/// * `.json`    – `[{ "epoch": 1, "metrics/mAP50(B)": 0.1, ... }, ...]`
///
/// Column names are stripped of surrounding whitespace; cell values are left alone.
pub fn load_file(path: &Path) -> Result<MetricsTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        _ => load_csv(path),
    }
    .with_context(|| format!("loading metrics from {}", path.display()))?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.column_names(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, comma separated.
/// Training logs right-align their columns, e.g. `"      epoch,  metrics/mAP50(B)"`.
/// Short rows are padded with nulls; rows longer than the header are an error.
fn load_csv(path: &Path) -> Result<MetricsTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() > headers.len() {
            bail!(
                "CSV row {row_no}: expected {} fields, saw {}",
                headers.len(),
                record.len()
            );
        }
        rows.push(record.iter().map(CellValue::infer).collect());
    }

    Ok(MetricsTable::from_rows(path, headers, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "epoch": 1, "metrics/mAP50(B)": 0.12, "metrics/mAP50-95(B)": 0.07 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<MetricsTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    // Column order follows first appearance across records.
    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            let name = key.trim();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values = records
                .iter()
                .map(|rec| {
                    rec.as_object()
                        .and_then(|obj| obj.iter().find(|(k, _)| k.trim() == name))
                        .map_or(CellValue::Null, |(_, v)| json_to_cell(v))
                })
                .collect();
            Column { name, values }
        })
        .collect();

    Ok(MetricsTable::new(path, columns))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per metric.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<MetricsTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let mut columns: Vec<Column> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| Column {
            name: f.name().trim().to_string(),
            values: Vec::new(),
        })
        .collect();

    let reader = builder.build().context("building parquet reader")?;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                let cell = extract_cell(array, row)
                    .with_context(|| format!("column '{}', row {row}", column.name))?;
                column.values.push(cell);
            }
        }
    }

    Ok(MetricsTable::new(path, columns))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64)
        }
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::model::{EPOCH_COLUMN, MAP50_95_COLUMN, MAP50_COLUMN};

    #[test]
    fn csv_headers_are_trimmed_and_values_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("results.csv");
        fs::write(
            &path,
            "                  epoch,    metrics/mAP50(B), metrics/mAP50-95(B) ,note\n\
             1,0.125,0.0625,warmup\n\
             2,  0.25,0.125,\n",
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(
            table.column_names(),
            vec![EPOCH_COLUMN, MAP50_COLUMN, MAP50_95_COLUMN, "note"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.epochs().unwrap(), vec![1, 2]);
        assert_eq!(table.metric_values(MAP50_COLUMN).unwrap(), vec![0.125, 0.25]);
        assert_eq!(
            table.column("note").unwrap().values,
            vec![CellValue::String("warmup".into()), CellValue::Null]
        );
    }

    #[test]
    fn overlong_csv_row_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.csv");
        fs::write(&path, "epoch,metrics/mAP50(B)\n1,0.1\n2,0.2,0.3\n").unwrap();

        let err = load_file(&path).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("CSV row 1: expected 2 fields, saw 3"), "{chain}");
    }

    #[test]
    fn short_csv_row_is_padded_with_nulls() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("short.csv");
        fs::write(
            &path,
            "epoch,metrics/mAP50(B),metrics/mAP50-95(B)\n1,0.1,0.05\n2,0.2\n",
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.column(MAP50_95_COLUMN).unwrap().values,
            vec![CellValue::Float(0.05), CellValue::Null]
        );
        assert_eq!(table.metric_values(MAP50_COLUMN).unwrap(), vec![0.1, 0.2]);
    }

    #[test]
    fn missing_file_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_file(&tmp.path().join("nope.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("nope.csv"));
    }

    #[test]
    fn json_records_fill_missing_keys_with_null() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("results.json");
        fs::write(
            &path,
            r#"[{" epoch ": 1, "metrics/mAP50(B)": 0.5},
                {" epoch ": 2, "metrics/mAP50(B)": 0.75, "lr": 0.01}]"#,
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.epochs().unwrap(), vec![1, 2]);
        assert_eq!(
            table.column("lr").unwrap().values,
            vec![CellValue::Null, CellValue::Float(0.01)]
        );
    }

    #[test]
    fn parquet_columns_are_read_and_trimmed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("results.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new(" epoch", DataType::Int64, false),
            Field::new("metrics/mAP50(B) ", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(Float64Array::from(vec![Some(0.1), None, Some(0.3)])),
            ],
        )
        .unwrap();
        let file = fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.column_names(), vec![EPOCH_COLUMN, MAP50_COLUMN]);
        assert_eq!(table.epochs().unwrap(), vec![1, 2, 3]);
        assert_eq!(
            table.column(MAP50_COLUMN).unwrap().values,
            vec![CellValue::Float(0.1), CellValue::Null, CellValue::Float(0.3)]
        );
    }
}
