//! Settings module: the flat key/value configuration of a queue session.
//!
//! Settings live in a small INI-style file with a single `[yt-dlp]` section:
//!
//! ```text
//! [yt-dlp]
//! download_directory=/home/ada/Downloads
//! temp_download_directory=/home/ada/Downloads/ytqueue
//! yt_dlp_options=-f bv*[height<=1080][ext=mp4]+ba*[ext=m4a] -N 2
//! use_temp_folder=False
//! suppress_output=True
//! retry_delay=15
//! ```
//!
//! # Overview
//!
//! - [`Settings`] - In-memory value, owned by the caller
//! - [`SettingsStore`] - Loads and saves [`Settings`] for one file
//! - [`SettingsError`] - Store and validation failures
//!
//! Loading never fails on bad content: a missing or blank file is replaced
//! with defaults, a missing section header is inserted, and unparsable values
//! fall back to their defaults.

mod error;
mod store;
mod update;

pub use error::SettingsError;
pub use store::{LoadedSettings, SECTION_HEADER, SettingsStore, parse_settings, render_settings};
pub use update::{
    parse_toggle, set_download_dir, set_retry_delay, set_staging_dir, set_tool_args,
};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::download::ARCHIVE_FILE_NAME;

/// Default final download directory, relative to home.
pub const DEFAULT_DOWNLOAD_SUBPATH: &str = "Downloads";

/// Default staging directory, relative to home.
///
/// A staging directory under this subpath is created on demand and removed
/// after relocation; any other staging directory is left in place.
pub const DEFAULT_STAGING_SUBPATH: &str = "Downloads/ytqueue";

/// Default external tool arguments.
pub const DEFAULT_TOOL_ARGS: &str = "-f bv*[height<=1080][ext=mp4]+ba*[ext=m4a] -N 2";

/// Default retry delay in minutes.
pub const DEFAULT_RETRY_DELAY_MINUTES: u64 = 15;

/// Default external tool executable.
pub const DEFAULT_TOOL_BINARY: &str = "yt-dlp";

/// User-configurable session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Final destination for downloaded files.
    pub download_dir: PathBuf,
    /// Intermediate working directory used when `use_staging` is set.
    pub staging_dir: PathBuf,
    /// Download into `staging_dir` and relocate afterwards.
    pub use_staging: bool,
    /// Extra arguments passed to the tool, whitespace separated.
    pub tool_args: String,
    /// Fixed wait between failed attempts, in minutes.
    pub retry_delay_minutes: u64,
    /// Show a single status line instead of raw tool output.
    pub suppress_output: bool,
    /// Raise the default log level to debug.
    pub debug: bool,
    /// Reject URLs whose host is not a recognized video site.
    pub validate_urls: bool,
    /// Probe each URL before invoking the tool.
    pub check_links: bool,
    /// External tool executable name or path.
    pub tool_binary: String,
}

impl Settings {
    /// Returns the default settings with paths rooted at `home`.
    #[must_use]
    pub fn defaults(home: &Path) -> Self {
        Self {
            download_dir: home.join(DEFAULT_DOWNLOAD_SUBPATH),
            staging_dir: home.join(DEFAULT_STAGING_SUBPATH),
            use_staging: false,
            tool_args: DEFAULT_TOOL_ARGS.to_string(),
            retry_delay_minutes: DEFAULT_RETRY_DELAY_MINUTES,
            suppress_output: true,
            debug: false,
            validate_urls: true,
            check_links: true,
            tool_binary: DEFAULT_TOOL_BINARY.to_string(),
        }
    }

    /// Tool arguments split on whitespace.
    #[must_use]
    pub fn tool_arg_tokens(&self) -> Vec<String> {
        self.tool_args
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_minutes.saturating_mul(60))
    }

    /// Location of the tool's download ledger inside the staging directory.
    #[must_use]
    pub fn archive_file(&self) -> PathBuf {
        self.staging_dir.join(ARCHIVE_FILE_NAME)
    }

    /// Directory the tool should run in for this session.
    #[must_use]
    pub fn target_dir(&self) -> &Path {
        if self.use_staging {
            &self.staging_dir
        } else {
            &self.download_dir
        }
    }

    /// Returns true when the staging directory is the well-known default location.
    #[must_use]
    pub fn is_default_staging(&self, home: &Path) -> bool {
        crate::paths::normalized(&self.staging_dir)
            .starts_with(crate::paths::normalized(&home.join(DEFAULT_STAGING_SUBPATH)))
    }
}
