//! Error types for loading and saving the flat key = value configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or saving configuration.
///
/// Parse failures are fatal by design: there is no recovery policy for a
/// partial or corrupt configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A line does not have the `key = value` shape.
    #[error("invalid configuration at {path}:{line}: {message}")]
    ParseError {
        /// Path to the file containing the error.
        path: PathBuf,
        /// One-based line index of the error.
        line: usize,
        /// Human-readable description of the parse failure.
        message: String,
    },

    /// The same key appears twice in the file.
    #[error("duplicate configuration key '{key}' at {path}:{line}")]
    DuplicateKey {
        /// Path to the file containing the duplicate.
        path: PathBuf,
        /// One-based line index of the second occurrence.
        line: usize,
        /// The duplicated key.
        key: String,
    },

    /// A key was looked up without a default and is not set.
    #[error("missing configuration key '{key}' in {path}")]
    MissingKey {
        /// The key that was requested.
        key: String,
        /// Path of the configuration file.
        path: PathBuf,
    },

    /// Failed to write the configuration file to disk.
    #[error("failed to write configuration file: {path}")]
    WriteError {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
