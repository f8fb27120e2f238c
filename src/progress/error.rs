//! Error types for the progress store.

use std::path::PathBuf;

use thiserror::Error;

/// Storage failures. Any of these aborts the book's run: without a working
/// store the run cannot keep its resume bookkeeping honest.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing or deleting on disk failed.
    #[error("storage IO error at {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The progress file exists but is not a valid record array.
    #[error(
        "malformed progress file {path}: {source}\n  Suggestion: fix or remove the file; completed chapters are listed in it"
    )]
    Malformed {
        /// The progress file.
        path: PathBuf,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Encoding state to JSON failed.
    #[error("failed to encode {path}: {source}")]
    Encode {
        /// The file that was being written.
        path: PathBuf,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a malformed-file error.
    pub fn malformed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Malformed {
            path: path.into(),
            source,
        }
    }

    /// Creates an encode error.
    pub fn encode(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Encode {
            path: path.into(),
            source,
        }
    }
}
