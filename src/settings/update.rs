//! Validated setters used by the `set*` commands.
//!
//! Each setter mutates the caller's [`Settings`] only when the new value is
//! acceptable; persisting is left to the caller.

use std::path::{Path, PathBuf};

use super::{Settings, SettingsError};
use crate::paths::{expand_home, is_within, is_writable_dir, same_dir};

/// Parses a `y`/`n` style toggle.
///
/// ```
/// use ytqueue_core::settings::parse_toggle;
///
/// assert_eq!(parse_toggle("Yes"), Some(true));
/// assert_eq!(parse_toggle("n"), Some(false));
/// assert_eq!(parse_toggle("perhaps"), None);
/// ```
#[must_use]
pub fn parse_toggle(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

fn writable_dir(raw: &str, home: &Path) -> Result<PathBuf, SettingsError> {
    let path = expand_home(raw, home);
    if !path.is_dir() {
        return Err(SettingsError::NotADirectory { path });
    }
    if !is_writable_dir(&path) {
        return Err(SettingsError::NotWritable { path });
    }
    Ok(path)
}

/// Sets the final download directory.
///
/// # Errors
///
/// Rejects paths equal to or inside the staging directory, non-directories
/// and directories without write permission.
pub fn set_download_dir(
    settings: &mut Settings,
    raw: &str,
    home: &Path,
) -> Result<PathBuf, SettingsError> {
    let candidate = expand_home(raw, home);
    if same_dir(&candidate, &settings.staging_dir) {
        return Err(SettingsError::SameDirectories { path: candidate });
    }
    if is_within(&candidate, &settings.staging_dir) {
        return Err(SettingsError::DownloadInsideStaging {
            download_dir: candidate,
            staging_dir: settings.staging_dir.clone(),
        });
    }
    let path = writable_dir(raw, home)?;
    settings.download_dir.clone_from(&path);
    Ok(path)
}

/// Sets the staging directory.
///
/// # Errors
///
/// Rejects paths equal to or containing the download directory,
/// non-directories and directories without write permission. A staging
/// directory inside the download directory is allowed.
pub fn set_staging_dir(
    settings: &mut Settings,
    raw: &str,
    home: &Path,
) -> Result<PathBuf, SettingsError> {
    let candidate = expand_home(raw, home);
    if same_dir(&candidate, &settings.download_dir) {
        return Err(SettingsError::SameDirectories { path: candidate });
    }
    if is_within(&settings.download_dir, &candidate) {
        return Err(SettingsError::DownloadInsideStaging {
            download_dir: settings.download_dir.clone(),
            staging_dir: candidate,
        });
    }
    let path = writable_dir(raw, home)?;
    settings.staging_dir.clone_from(&path);
    Ok(path)
}

/// Replaces the tool argument string verbatim.
pub fn set_tool_args(settings: &mut Settings, args: &str) {
    settings.tool_args = args.trim().to_string();
}

/// Sets the retry delay from user input in minutes.
///
/// # Errors
///
/// Returns [`SettingsError::InvalidDelay`] for negative or non-numeric input.
pub fn set_retry_delay(settings: &mut Settings, raw: &str) -> Result<u64, SettingsError> {
    let value: i64 = raw.trim().parse().map_err(|_| SettingsError::InvalidDelay {
        value: raw.to_string(),
        reason: "expected a whole number of minutes",
    })?;
    let minutes = u64::try_from(value).map_err(|_| SettingsError::InvalidDelay {
        value: raw.to_string(),
        reason: "delay cannot be negative",
    })?;
    settings.retry_delay_minutes = minutes;
    Ok(minutes)
}
