/// Data layer: metrics tables and their loaders.
///
/// Architecture:
/// ```text
///  results.csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, trim column names → MetricsTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ MetricsTable  │  named columns of CellValue, epoch / mAP accessors
///   └──────────────┘
/// ```

pub mod loader;
pub mod model;
