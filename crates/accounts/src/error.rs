//! Error types for account storage.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing the account document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON for the expected layout.
    #[error("Malformed account document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
