use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Fixed column names of an Ultralytics `results.csv`
// ---------------------------------------------------------------------------

pub const EPOCH_COLUMN: &str = "epoch";
pub const MAP50_COLUMN: &str = "metrics/mAP50(B)";
pub const MAP50_95_COLUMN: &str = "metrics/mAP50-95(B)";

/// Columns every table must carry before it can be charted.
pub const REQUIRED_COLUMNS: [&str; 3] = [EPOCH_COLUMN, MAP50_COLUMN, MAP50_95_COLUMN];

// ---------------------------------------------------------------------------
// CellValue – a single cell of a metrics table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a dataframe parser infers.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Infer the type of a raw text cell.
    ///
    /// Surrounding blanks are ignored when recognising numbers (training logs pad
    /// their columns), but text that is not a number is kept verbatim.
    pub fn infer(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        match s {
            "True" | "true" => CellValue::Bool(true),
            "False" | "false" => CellValue::Bool(false),
            _ => CellValue::String(raw.to_string()),
        }
    }

    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer view of the value; floats qualify only when they have no fraction.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Schema errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("column '{0}' has no values")]
    EmptyColumn(String),

    #[error("column '{column}', row {row}: '{value}' is not {expected}")]
    BadValue {
        column: String,
        row: usize,
        value: String,
        expected: &'static str,
    },
}

// ---------------------------------------------------------------------------
// MetricsTable – one training run
// ---------------------------------------------------------------------------

/// One named column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

/// The metrics of a single training run, column-oriented, columns in file order.
#[derive(Debug, Clone)]
pub struct MetricsTable {
    /// File the table was read from.
    pub source: PathBuf,
    pub columns: Vec<Column>,
}

impl MetricsTable {
    pub fn new(source: impl Into<PathBuf>, columns: Vec<Column>) -> Self {
        MetricsTable {
            source: source.into(),
            columns,
        }
    }

    /// Build a table from a header and row-major cells. Short rows are padded with `Null`.
    pub fn from_rows(
        source: impl Into<PathBuf>,
        names: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column {
                name,
                values: Vec::with_capacity(rows.len()),
            })
            .collect();
        for row in rows {
            let mut cells = row.into_iter();
            for col in &mut columns {
                col.values.push(cells.next().unwrap_or(CellValue::Null));
            }
        }
        MetricsTable::new(source, columns)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail on the first name in `names` that is not a column of this table.
    pub fn require_columns(&self, names: &[&str]) -> Result<(), SchemaError> {
        match names.iter().find(|n| self.column(n).is_none()) {
            Some(missing) => Err(SchemaError::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }

    fn require(&self, name: &str) -> Result<&Column, SchemaError> {
        self.column(name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
    }

    /// The `epoch` column as integers.
    pub fn epochs(&self) -> Result<Vec<i64>, SchemaError> {
        let col = self.require(EPOCH_COLUMN)?;
        if col.values.is_empty() {
            return Err(SchemaError::EmptyColumn(col.name.clone()));
        }
        col.values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.as_i64().ok_or_else(|| SchemaError::BadValue {
                    column: col.name.clone(),
                    row,
                    value: v.to_string(),
                    expected: "an integer",
                })
            })
            .collect()
    }

    /// A numeric column as floats; missing cells become NaN.
    pub fn metric_values(&self, name: &str) -> Result<Vec<f64>, SchemaError> {
        let col = self.require(name)?;
        col.values
            .iter()
            .enumerate()
            .map(|(row, v)| match v {
                CellValue::Null => Ok(f64::NAN),
                other => other.as_f64().ok_or_else(|| SchemaError::BadValue {
                    column: col.name.clone(),
                    row,
                    value: other.to_string(),
                    expected: "a number",
                }),
            })
            .collect()
    }
}
