//! Config directory resolution, home expansion and directory checks.

use std::env;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Directory name used under the config home.
pub const APP_DIR_NAME: &str = "ytqueue";

/// Settings file name inside the config directory.
pub const SETTINGS_FILE_NAME: &str = "options.conf";

/// Queue file name inside the config directory.
pub const QUEUE_FILE_NAME: &str = "queue.txt";

/// Errors raised while resolving or preparing application paths.
#[derive(Debug, Error)]
pub enum PathsError {
    /// Neither `$XDG_CONFIG_HOME` nor `$HOME` could be used.
    #[error("home directory is not set\n  Suggestion: export HOME or XDG_CONFIG_HOME")]
    HomeNotSet,

    /// The config directory could not be created.
    #[error("cannot create config directory {path}: {source}")]
    CreateDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Resolved locations of the home directory and the config directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    home: PathBuf,
    config_dir: PathBuf,
}

impl AppPaths {
    /// Builds paths from explicit locations (used by tests and embedders).
    #[must_use]
    pub fn new(home: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            config_dir: config_dir.into(),
        }
    }

    /// Resolves paths from the environment.
    ///
    /// Priority for the config directory:
    /// 1. `$XDG_CONFIG_HOME/ytqueue`
    /// 2. `$HOME/.config/ytqueue`
    ///
    /// `$HOME` is always required because settings paths may use `~`.
    pub fn resolve() -> Result<Self, PathsError> {
        let home = env_var_non_empty_os("HOME")
            .map(PathBuf::from)
            .ok_or(PathsError::HomeNotSet)?;
        let config_dir = env_var_non_empty_os("XDG_CONFIG_HOME").map_or_else(
            || home.join(".config").join(APP_DIR_NAME),
            |xdg| PathBuf::from(xdg).join(APP_DIR_NAME),
        );
        Ok(Self { home, config_dir })
    }

    /// Home directory used for `~` expansion.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Directory holding the settings and queue files.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE_NAME)
    }

    #[must_use]
    pub fn queue_file(&self) -> PathBuf {
        self.config_dir.join(QUEUE_FILE_NAME)
    }

    /// Creates the config directory if missing. Returns `true` when it was created.
    pub fn ensure_config_dir(&self) -> Result<bool, PathsError> {
        if self.config_dir.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&self.config_dir).map_err(|source| PathsError::CreateDir {
            path: self.config_dir.clone(),
            source,
        })?;
        debug!(dir = %self.config_dir.display(), "created config directory");
        Ok(true)
    }
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Expands a leading `~` against `home`.
///
/// Only `~` and `~/...` are expanded; `~user` forms are returned unchanged.
///
/// ```
/// use std::path::Path;
/// use ytqueue_core::paths::expand_home;
///
/// let home = Path::new("/home/ada");
/// assert_eq!(expand_home("~/Videos", home), Path::new("/home/ada/Videos"));
/// assert_eq!(expand_home("/srv/media", home), Path::new("/srv/media"));
/// ```
#[must_use]
pub fn expand_home(raw: &str, home: &Path) -> PathBuf {
    let trimmed = raw.trim();
    if trimmed == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        return home.join(rest.trim_start_matches('/'));
    }
    PathBuf::from(trimmed)
}

/// Normalizes a path for equality checks (trailing separators, `.` segments).
#[must_use]
pub fn normalized(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Returns true when both paths point to the same directory.
///
/// Existing directories are compared canonically; otherwise lexically.
#[must_use]
pub fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => normalized(a) == normalized(b),
    }
}

/// Returns true when `path` is `dir` itself or lies anywhere below it.
///
/// Paths are resolved through their deepest existing ancestor, so a missing
/// directory compares correctly against an existing one behind a symlink.
#[must_use]
pub fn is_within(path: &Path, dir: &Path) -> bool {
    resolved(path).starts_with(resolved(dir))
}

fn resolved(path: &Path) -> PathBuf {
    let lexical = normalized(path);
    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(mut canonical) = fs::canonicalize(existing) {
            canonical.extend(missing.iter().rev());
            return canonical;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return lexical.clone(),
        }
    }
}

/// Returns true when `path` is an existing directory the process can create files in.
///
/// Checked by creating and removing a probe file, which reflects ACLs and
/// read-only mounts that permission bits alone do not.
#[must_use]
pub fn is_writable_dir(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    let probe = path.join(format!(".ytqueue-write-probe-{}", std::process::id()));
    match OpenOptions::new().write(true).create_new(true).open(&probe) {
        Ok(file) => {
            drop(file);
            let _ = fs::remove_file(&probe);
            true
        }
        Err(error) => {
            debug!(dir = %path.display(), %error, "directory is not writable");
            false
        }
    }
}
