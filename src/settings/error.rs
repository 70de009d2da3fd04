//! Error types for settings operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading, writing or updating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read settings file {path}: {source}")]
    Read {
        /// Settings file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file could not be written.
    #[error("cannot write settings file {path}: {source}")]
    Write {
        /// Settings file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A directory setting points to something that is not a directory.
    #[error("invalid directory: {path}\n  Suggestion: provide an existing directory path")]
    NotADirectory {
        /// Rejected path.
        path: PathBuf,
    },

    /// A directory setting points to a directory without write permission.
    #[error("directory is not writable: {path}")]
    NotWritable {
        /// Rejected path.
        path: PathBuf,
    },

    /// Download and staging directories would be the same.
    #[error(
        "temporary download folder and destination download folder are the same: {path}\n  Suggestion: disable the temporary folder instead"
    )]
    SameDirectories {
        /// The shared path.
        path: PathBuf,
    },

    /// The download directory would sit inside the staging directory.
    #[error(
        "download folder {download_dir} is inside the temporary folder {staging_dir}\n  Suggestion: choose folders that are not nested in that order"
    )]
    DownloadInsideStaging {
        /// Final download directory.
        download_dir: PathBuf,
        /// Staging directory containing it.
        staging_dir: PathBuf,
    },

    /// A yes/no toggle received something else.
    #[error("invalid value '{value}' for {key}: expected y or n")]
    InvalidToggle {
        /// Setting being changed.
        key: &'static str,
        /// Rejected input.
        value: String,
    },

    /// Retry delay was negative or not a number.
    #[error("invalid retry delay '{value}': {reason}")]
    InvalidDelay {
        /// Rejected input.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_directories_message_has_suggestion() {
        let err = SettingsError::SameDirectories {
            path: PathBuf::from("/media"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/media"));
        assert!(msg.contains("Suggestion"));
    }

    #[test]
    fn test_invalid_delay_message() {
        let err = SettingsError::InvalidDelay {
            value: "-3".to_string(),
            reason: "delay cannot be negative",
        };
        assert_eq!(
            err.to_string(),
            "invalid retry delay '-3': delay cannot be negative"
        );
    }
}
