//! File-backed preference sources for the tester.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use persona_core::constants::PREFS_STORAGE_KEY;
use persona_core::{PreferenceRecord, PreferenceSource};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parsing error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn read_file(path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Key-value store snapshot saved as a flat JSON object.
///
/// Values are normally strings holding serialized JSON, the way browser
/// storage keeps them; object values are accepted and re-serialized.
#[derive(Debug, Clone)]
pub struct KeyValueFile {
    path: PathBuf,
}

impl KeyValueFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read every entry of the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object.
    pub fn entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = read_file(&self.path)?;
        let map: BTreeMap<String, Value> =
            serde_json::from_str(&raw).map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;
        Ok(map
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(text) => (key, text),
                other => (key, other.to_string()),
            })
            .collect())
    }

    /// Raw stored value for `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries()?.remove(key))
    }
}

impl PreferenceSource for KeyValueFile {
    type Error = StoreError;

    fn load_preferences(&self) -> Result<PreferenceRecord, Self::Error> {
        let raw = self.get(PREFS_STORAGE_KEY)?;
        Ok(PreferenceRecord::from_stored(raw.as_deref()))
    }
}

/// A preference record stored on its own as a JSON document.
#[derive(Debug, Clone)]
pub struct PreferenceFile {
    path: PathBuf,
}

impl PreferenceFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceSource for PreferenceFile {
    type Error = StoreError;

    fn load_preferences(&self) -> Result<PreferenceRecord, Self::Error> {
        let raw = read_file(&self.path)?;
        PreferenceRecord::from_json(&raw).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }
}

/// Field-by-field overrides given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferenceOverrides {
    pub max_fee: Option<f64>,
    pub max_walk: Option<f64>,
    pub min_co2: Option<f64>,
    pub max_day: Option<f64>,
    pub mode: Option<f64>,
}

impl PreferenceOverrides {
    #[must_use]
    pub fn apply(&self, base: PreferenceRecord) -> PreferenceRecord {
        PreferenceRecord {
            max_fee: self.max_fee.or(base.max_fee),
            max_walk: self.max_walk.or(base.max_walk),
            min_co2: self.min_co2.or(base.min_co2),
            max_day: self.max_day.or(base.max_day),
            mode: self.mode.or(base.mode),
        }
    }
}
