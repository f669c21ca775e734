//! Error types for timesift-batch

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    // Job file errors
    #[error("Failed to read job file {path}: {source}")]
    JobFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse job file {path}: {reason}")]
    JobFileParse { path: PathBuf, reason: String },

    // Site job errors
    #[error("Site '{site}' is missing required field '{field}' (set it on the site or in [defaults])")]
    MissingField { site: String, field: &'static str },

    #[error("Site '{site}' has an invalid value for '{field}': {reason}")]
    InvalidValue {
        site: String,
        field: &'static str,
        reason: String,
    },

    #[error("Site '{site}' has degenerate bounds {bounds}: {reason}")]
    DegenerateBounds {
        site: String,
        bounds: String,
        reason: String,
    },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, BatchError>;
