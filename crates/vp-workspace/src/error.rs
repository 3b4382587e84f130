// error.rs — Error types for the policy workspace.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing workspace policies.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// No stored policy exists at the expected path.
    #[error("no stored policy at {path}")]
    NotFound { path: PathBuf },

    /// A stored policy could not be parsed.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    /// A policy could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
