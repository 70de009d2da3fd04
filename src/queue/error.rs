//! Error types for queue operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue file exists but could not be read.
    #[error("cannot read queue file {path}: {source}")]
    Read {
        /// Queue file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The queue file could not be rewritten.
    #[error("cannot write queue file {path}: {source}")]
    Write {
        /// Queue file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Remove-by-index was given an index past the end.
    #[error(
        "index {index} out of range for queue of {len} entries\n  Suggestion: run `ytqueue show` to list valid indexes"
    )]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Queue length at the time.
        len: usize,
    },
}
