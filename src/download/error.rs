//! Error types for the download module.
//!
//! Per-URL failures (invalid links, tool exits) are not errors here: the
//! processor downgrades them to dropped entries. These types cover the
//! conditions that stop a whole session.

use std::path::PathBuf;

use thiserror::Error;

use crate::queue::QueueError;

/// Errors raised while invoking the external tool.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The executable could not be found on `PATH` or at the given location.
    #[error("external tool '{program}' not found\n  Suggestion: install it or set `tool_binary` in the settings file")]
    NotFound {
        /// Program that was looked up.
        program: String,
    },

    /// The process could not be started for another reason.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        /// Program that failed.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child process failed.
    #[error("failed waiting for '{program}': {source}")]
    Wait {
        /// Program that was running.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while moving staged output into the final directory.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// Staging directory could not be listed.
    #[error("cannot read staging directory {path}: {source}")]
    ReadDir {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A staged entry could not be moved.
    #[error("cannot move {from} to {to}: {source}")]
    Move {
        /// Source path in staging.
        from: PathBuf,
        /// Destination path.
        to: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A file or directory could not be deleted.
    #[error("cannot remove {path}: {source}")]
    Remove {
        /// Path being removed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Queue could not be cleared during cleanup.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Errors that end a processing session early.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Staging directory could not be created.
    #[error("cannot create staging directory {path}: {source}\n  Suggestion: check permissions of the parent directory or disable the temporary folder")]
    StagingCreate {
        /// Staging directory.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Final directory is the staging directory or lies inside it.
    #[error("download folder {final_dir} is inside the temporary folder {staging}\n  Suggestion: run `ytqueue setdir` or `ytqueue settemp` to separate them")]
    FinalInsideStaging {
        /// Final download directory.
        final_dir: PathBuf,
        /// Staging directory.
        staging: PathBuf,
    },

    /// Target directory exists but cannot be written.
    #[error("download target {path} is missing or not writable")]
    TargetNotWritable {
        /// Directory the tool would run in.
        path: PathBuf,
    },

    /// External tool is not installed; no URL can succeed.
    #[error(transparent)]
    ToolUnavailable(RunnerError),

    /// Queue could not be persisted.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Staged output could not be relocated.
    #[error(transparent)]
    Relocate(#[from] RelocateError),
}
