//! Flat `key = value` configuration persistence.
//!
//! The whole file is read into memory at load time; [`FleetConfig::reload`]
//! replaces the in-memory set wholesale and [`FleetConfig::save`] writes the
//! whole set back, overwriting the file. Malformed lines and duplicate keys
//! are fatal at load time — there is no policy for silently skipping bad
//! entries.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

mod error;
pub use error::ConfigError;

/// In-memory mirror of one flat configuration file.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FleetConfig {
    /// Loads the configuration at `path`.
    ///
    /// A missing file yields an empty set (first run); any other read or
    /// parse failure is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self {
            path: path.into(),
            entries: BTreeMap::new(),
        };
        config.reload()?;
        Ok(config)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the file, replacing the in-memory set wholesale.
    ///
    /// On failure the previous in-memory set is left untouched.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        tracing::debug!(path = %self.path.display(), "reloading configuration");

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(ConfigError::ReadError {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let mut entries = BTreeMap::new();
        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            let Some((key, value)) = raw.split_once('=') else {
                return Err(ConfigError::ParseError {
                    path: self.path.clone(),
                    line,
                    message: format!("expected 'key = value', got '{}'", raw.trim()),
                });
            };
            let key = key.trim().to_string();
            if entries.contains_key(&key) {
                return Err(ConfigError::DuplicateKey {
                    path: self.path.clone(),
                    line,
                    key,
                });
            }
            entries.insert(key, value.trim().to_string());
        }

        self.entries = entries;
        tracing::debug!(count = self.entries.len(), "loaded configuration entries");
        Ok(())
    }

    /// Serializes the whole in-memory set back to disk, overwriting.
    pub fn save(&self) -> Result<(), ConfigError> {
        tracing::debug!(path = %self.path.display(), "saving configuration");

        let mut content = String::new();
        for (key, value) in &self.entries {
            content.push_str(key);
            content.push_str(" = ");
            content.push_str(value);
            content.push('\n');
        }

        fs::write(&self.path, content).map_err(|e| ConfigError::WriteError {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Retrieves the value of `key`. Missing keys are a hard error.
    pub fn get(&self, key: &str) -> Result<&str, ConfigError> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingKey {
                key: key.to_string(),
                path: self.path.clone(),
            })
    }

    /// Retrieves the value of `key`, falling back to `default` silently.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.entries.get(key).map_or(default, String::as_str)
    }

    /// Stores `value` under `key` in memory, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries.insert(key.into(), value.to_string());
    }

    /// Iterates over all entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries currently in memory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
