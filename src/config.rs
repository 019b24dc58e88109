use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value as YamlValue;
use thiserror::Error;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Printed when the configuration yields no runs to compare.
pub const NO_ENTRIES_MESSAGE: &str =
    "No CSV files were added in the config file. The program has ended.";

/// One training run to compare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub file_path: String,
    pub model_name: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config file {path:?} must contain a list of entries")]
    NotAList { path: PathBuf },

    #[error("config entry {index} is missing key '{key}'")]
    MissingKey { index: usize, key: &'static str },

    #[error("config entry {index}: '{key}' must be a string")]
    InvalidValue { index: usize, key: &'static str },
}

/// Load the list of runs from a YAML (or JSON) config file.
///
/// A missing file is reported on stdout and yields no entries, as does a file whose
/// content is empty or falsy (`null`, `[]`, `{}`, `false`, `0`, `""`).
pub fn load(path: &Path) -> Result<Vec<ConfigEntry>, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("config file {} does not exist", path.display());
            println!("The config file '{}' was not found.", path.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let root: YamlValue = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if is_falsy(&root) {
        return Ok(Vec::new());
    }
    let YamlValue::Sequence(items) = root else {
        return Err(ConfigError::NotAList {
            path: path.to_path_buf(),
        });
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Ok(ConfigEntry {
                file_path: string_key(item, index, "file_path")?,
                model_name: label_key(item, index, "model_name")?,
            })
        })
        .collect()
}

fn string_key(item: &YamlValue, index: usize, key: &'static str) -> Result<String, ConfigError> {
    match item.get(key) {
        None => Err(ConfigError::MissingKey { index, key }),
        Some(YamlValue::String(s)) => Ok(s.clone()),
        Some(_) => Err(ConfigError::InvalidValue { index, key }),
    }
}

/// Like [`string_key`], but number and boolean scalars are taken as their text.
fn label_key(item: &YamlValue, index: usize, key: &'static str) -> Result<String, ConfigError> {
    match item.get(key) {
        Some(YamlValue::Number(n)) => Ok(n.to_string()),
        Some(YamlValue::Bool(b)) => Ok(b.to_string()),
        _ => string_key(item, index, key),
    }
}

fn is_falsy(value: &YamlValue) -> bool {
    match value {
        YamlValue::Null => true,
        YamlValue::Bool(b) => !b,
        YamlValue::Number(n) => n.as_f64() == Some(0.0),
        YamlValue::String(s) => s.is_empty(),
        YamlValue::Sequence(seq) => seq.is_empty(),
        YamlValue::Mapping(map) => map.is_empty(),
        YamlValue::Tagged(tagged) => is_falsy(&tagged.value),
    }
}
