use std::path::Path;

use anyhow::{Context, Result};

use crate::chart::SeriesDescriptor;
use crate::config::ConfigEntry;
use crate::data::loader::load_file;

/// Read every configured run, in config order.
///
/// The first unreadable table aborts the whole run.
pub fn load_series(entries: &[ConfigEntry]) -> Result<Vec<SeriesDescriptor>> {
    entries
        .iter()
        .map(|entry| {
            let table = load_file(Path::new(&entry.file_path))
                .with_context(|| format!("reading run '{}'", entry.model_name))?;
            Ok(SeriesDescriptor {
                model_name: entry.model_name.clone(),
                table,
            })
        })
        .collect()
}
