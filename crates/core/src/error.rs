//! Error types for the preprocessing pipeline.
//!
//! Structural violations (alignment, capacity, configuration) are fatal and
//! carry their own variant so callers can tell them apart. Per-line
//! conditions such as malformed input bytes are recovered where they occur
//! and only surface here when a caller asks for strict handling.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the preprocessing library.
#[derive(Error, Debug)]
pub enum PrepError {
    /// Source and target corpora do not have the same number of lines.
    #[error("Alignment error: source has {src_lines} lines, target has {tgt_lines}")]
    Alignment { src_lines: usize, tgt_lines: usize },

    /// Unrecognized or inconsistent configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Input line is not valid UTF-8.
    #[error("Malformed UTF-8 at line {line}")]
    Encoding { line: u64 },

    /// A size limit leaves no usable room.
    #[error("Capacity error: {0}")]
    Capacity(String),

    /// Error loading an artifact
    #[error("Load error: {0}")]
    Load(String),

    /// Error saving an artifact
    #[error("Save error: {0}")]
    Save(String),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown token ID
    #[error("Unknown token ID: {0}")]
    UnknownTokenId(u32),

    /// Invalid merge rule
    #[error("Invalid merge rule: {0}")]
    InvalidMerge(String),
}

impl PrepError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            err,
        }
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PrepError>;
