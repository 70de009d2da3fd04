//! Moving staged output into the final directory, and session cleanup.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::constants::ARCHIVE_FILE_NAME;
use super::error::RelocateError;
use crate::paths;
use crate::queue::{Queue, QueueStore};
use crate::settings::Settings;

/// What a relocation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationReport {
    /// Final paths of moved entries, in directory-listing order.
    pub moved: Vec<PathBuf>,
    /// The ledger was found in staging and deleted.
    pub ledger_removed: bool,
}

impl RelocationReport {
    /// True when staging held nothing besides, at most, the ledger.
    #[must_use]
    pub fn nothing_to_move(&self) -> bool {
        self.moved.is_empty()
    }
}

/// What a cleanup pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// URLs dropped from the queue.
    pub urls_removed: usize,
    /// Top-level staging entries deleted.
    pub staged_entries_removed: usize,
    /// The ledger existed and was deleted.
    pub ledger_removed: bool,
}

/// Moves every staged entry except the ledger into `final_dir`.
///
/// The ledger is deleted in place. An existing entry of the same name in
/// `final_dir` is replaced. A missing staging directory counts as empty.
/// Nothing is moved when both directories are the same, and an entry that
/// contains `final_dir` stays where it is.
///
/// # Errors
///
/// Returns [`RelocateError`] when staging cannot be listed or an entry
/// cannot be moved or deleted. Entries moved before the failure stay moved.
#[instrument(fields(staging = %staging.display(), final_dir = %final_dir.display()))]
pub fn relocate_staged(staging: &Path, final_dir: &Path) -> Result<RelocationReport, RelocateError> {
    let mut report = RelocationReport::default();
    if paths::same_dir(staging, final_dir) {
        warn!("staging directory is the download directory, nothing to relocate");
        return Ok(report);
    }
    let entries = match fs::read_dir(staging) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            debug!("staging directory missing, nothing to move");
            return Ok(report);
        }
        Err(source) => {
            return Err(RelocateError::ReadDir {
                path: staging.to_path_buf(),
                source,
            });
        }
    };

    let mut pending = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RelocateError::ReadDir {
            path: staging.to_path_buf(),
            source,
        })?;
        pending.push(entry.path());
    }
    pending.sort();

    if pending.iter().any(|path| !is_ledger(path)) {
        fs::create_dir_all(final_dir).map_err(|source| RelocateError::Move {
            from: staging.to_path_buf(),
            to: final_dir.to_path_buf(),
            source,
        })?;
    }

    for from in pending {
        if is_ledger(&from) {
            remove_path(&from)?;
            report.ledger_removed = true;
            continue;
        }
        let Some(name) = from.file_name() else {
            continue;
        };
        let to = final_dir.join(name);
        if paths::is_within(final_dir, &from) || paths::is_within(&to, &from) {
            warn!(entry = %from.display(), "staged entry holds the download directory, leaving it");
            continue;
        }
        move_entry(&from, &to)?;
        debug!(from = %from.display(), to = %to.display(), "moved staged entry");
        report.moved.push(to);
    }

    info!(moved = report.moved.len(), "relocation finished");
    Ok(report)
}

/// Deletes every entry inside `staging`, keeping the directory itself.
///
/// Returns the number of top-level entries removed.
///
/// # Errors
///
/// Returns [`RelocateError`] if the directory cannot be listed or an entry
/// cannot be deleted.
#[instrument(fields(staging = %staging.display()))]
pub fn purge_staging(staging: &Path) -> Result<usize, RelocateError> {
    let entries = match fs::read_dir(staging) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(0),
        Err(source) => {
            return Err(RelocateError::ReadDir {
                path: staging.to_path_buf(),
                source,
            });
        }
    };
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|source| RelocateError::ReadDir {
            path: staging.to_path_buf(),
            source,
        })?;
        remove_path(&entry.path())?;
        removed += 1;
    }
    Ok(removed)
}

/// Removes the staging directory when it is the default location and empty.
///
/// # Errors
///
/// Returns [`RelocateError::Remove`] if the empty directory cannot be deleted.
pub fn remove_default_staging_if_empty(
    settings: &Settings,
    home: &Path,
) -> Result<bool, RelocateError> {
    let staging = &settings.staging_dir;
    if !settings.is_default_staging(home) {
        return Ok(false);
    }
    let is_empty = match fs::read_dir(staging) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => return Ok(false),
    };
    if !is_empty {
        return Ok(false);
    }
    fs::remove_dir(staging).map_err(|source| RelocateError::Remove {
        path: staging.clone(),
        source,
    })?;
    debug!(path = %staging.display(), "removed default staging directory");
    Ok(true)
}

/// Empties the queue, deletes the ledger and purges staging contents.
///
/// Staging is left untouched when the final download directory is the
/// staging directory or lies inside it.
///
/// # Errors
///
/// Returns [`RelocateError`] if the queue cannot be persisted or a staged
/// entry cannot be deleted.
#[instrument(skip_all, fields(staging = %settings.staging_dir.display()))]
pub fn clear_session(
    queue: &mut Queue,
    store: &dyn QueueStore,
    settings: &Settings,
) -> Result<ClearReport, RelocateError> {
    let mut report = ClearReport {
        urls_removed: queue.len(),
        ..ClearReport::default()
    };
    queue.clear();
    store.save(queue)?;

    let ledger = settings.archive_file();
    if ledger.is_file() {
        remove_path(&ledger)?;
        report.ledger_removed = true;
    }

    if paths::is_within(&settings.download_dir, &settings.staging_dir) {
        warn!(
            path = %settings.staging_dir.display(),
            "staging directory holds the download directory, not purging"
        );
    } else {
        report.staged_entries_removed = purge_staging(&settings.staging_dir)?;
    }

    info!(
        urls = report.urls_removed,
        staged = report.staged_entries_removed,
        "session cleared"
    );
    Ok(report)
}

fn is_ledger(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == ARCHIVE_FILE_NAME)
}

fn move_entry(from: &Path, to: &Path) -> Result<(), RelocateError> {
    let move_error = |source: std::io::Error| RelocateError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if fs::symlink_metadata(to).is_ok() {
        remove_path(to)?;
    }
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(error) => {
            debug!(%error, "rename failed, copying instead");
            copy_recursive(from, to).map_err(move_error)?;
            remove_path(from)
        }
    }
}

fn copy_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::symlink_metadata(from)?.is_dir() {
        fs::create_dir_all(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
    } else {
        fs::copy(from, to)?;
    }
    Ok(())
}

fn remove_path(path: &Path) -> Result<(), RelocateError> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(error) => Err(error),
    };
    match result {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(RelocateError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::queue::FileQueueStore;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_relocate_moves_files_and_drops_ledger() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("stage");
        let final_dir = temp.path().join("final");
        write(&staging.join("a.mp4"), "a");
        write(&staging.join("b.mp4"), "b");
        write(&staging.join(ARCHIVE_FILE_NAME), "youtube abc\n");

        let report = relocate_staged(&staging, &final_dir).unwrap();

        assert_eq!(report.moved, vec![final_dir.join("a.mp4"), final_dir.join("b.mp4")]);
        assert!(report.ledger_removed);
        assert_eq!(fs::read_to_string(final_dir.join("a.mp4")).unwrap(), "a");
        assert!(!final_dir.join(ARCHIVE_FILE_NAME).exists());
        assert_eq!(fs::read_dir(&staging).unwrap().count(), 0);
    }

    #[test]
    fn test_relocate_empty_staging_is_nothing_to_move() {
        let temp = TempDir::new().unwrap();
        let report = relocate_staged(temp.path(), &temp.path().join("final")).unwrap();
        assert!(report.nothing_to_move());
        assert!(!temp.path().join("final").exists());

        let missing = relocate_staged(&temp.path().join("nope"), temp.path()).unwrap();
        assert!(missing.nothing_to_move());
    }

    #[test]
    fn test_relocate_replaces_existing_entries() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("stage");
        let final_dir = temp.path().join("final");
        write(&staging.join("a.mp4"), "new");
        write(&final_dir.join("a.mp4"), "old");
        write(&staging.join("album/track.m4a"), "t");
        write(&final_dir.join("album/stale.m4a"), "s");

        relocate_staged(&staging, &final_dir).unwrap();

        assert_eq!(fs::read_to_string(final_dir.join("a.mp4")).unwrap(), "new");
        assert!(final_dir.join("album/track.m4a").exists());
        assert!(!final_dir.join("album/stale.m4a").exists());
    }

    #[test]
    fn test_relocate_into_same_dir_leaves_files_alone() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Downloads");
        write(&dir.join("a.mp4"), "a");
        write(&dir.join("b.mp4"), "b");
        let trailing = PathBuf::from(format!("{}/", dir.display()));

        let report = relocate_staged(&dir, &trailing).unwrap();

        assert!(report.nothing_to_move());
        assert_eq!(fs::read_to_string(dir.join("a.mp4")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dir.join("b.mp4")).unwrap(), "b");
    }

    #[test]
    fn test_relocate_skips_entry_holding_final_dir() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("stage");
        let final_dir = staging.join("done");
        write(&final_dir.join("old.mp4"), "old");
        write(&staging.join("new.mp4"), "new");

        let report = relocate_staged(&staging, &final_dir).unwrap();

        assert_eq!(report.moved, vec![final_dir.join("new.mp4")]);
        assert_eq!(fs::read_to_string(final_dir.join("new.mp4")).unwrap(), "new");
        assert!(final_dir.join("old.mp4").exists());
        assert!(!final_dir.join("done").exists());
    }

    #[test]
    fn test_copy_recursive_copies_tree() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("src/one/two.txt"), "2");
        copy_recursive(&temp.path().join("src"), &temp.path().join("dst")).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("dst/one/two.txt")).unwrap(),
            "2"
        );
    }

    #[test]
    fn test_purge_staging_keeps_directory() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("part.mp4.part"), "x");
        write(&temp.path().join("nested/frag"), "y");
        assert_eq!(purge_staging(temp.path()).unwrap(), 2);
        assert!(temp.path().is_dir());
        assert_eq!(purge_staging(&temp.path().join("missing")).unwrap(), 0);
    }

    #[test]
    fn test_remove_default_staging_only_when_default_and_empty() {
        let temp = TempDir::new().unwrap();
        let home = temp.path();
        let mut settings = Settings::defaults(home);
        fs::create_dir_all(&settings.staging_dir).unwrap();
        write(&settings.staging_dir.join("left.mp4"), "x");

        assert!(!remove_default_staging_if_empty(&settings, home).unwrap());
        fs::remove_file(settings.staging_dir.join("left.mp4")).unwrap();
        assert!(remove_default_staging_if_empty(&settings, home).unwrap());
        assert!(!settings.staging_dir.exists());

        settings.staging_dir = home.join("custom-stage");
        fs::create_dir_all(&settings.staging_dir).unwrap();
        assert!(!remove_default_staging_if_empty(&settings, home).unwrap());
        assert!(settings.staging_dir.exists());
    }

    #[test]
    fn test_clear_session_empties_everything() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::defaults(temp.path());
        let store = FileQueueStore::new(temp.path().join("queue.txt"));
        let mut queue = Queue::from_entries(["https://youtu.be/a", "https://youtu.be/b"]);
        store.save(&queue).unwrap();
        write(&settings.staging_dir.join("a.mp4.part"), "x");
        write(&settings.archive_file(), "youtube a\n");

        let report = clear_session(&mut queue, &store, &settings).unwrap();

        assert_eq!(report.urls_removed, 2);
        assert!(report.ledger_removed);
        assert_eq!(report.staged_entries_removed, 1);
        assert!(queue.is_empty());
        assert!(store.load().unwrap().is_empty());
        assert_eq!(fs::read_dir(&settings.staging_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_clear_session_never_purges_download_dir() {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings::defaults(temp.path());
        settings.staging_dir = settings.download_dir.clone();
        write(&settings.download_dir.join("keep.mp4"), "k");
        let store = FileQueueStore::new(temp.path().join("queue.txt"));
        let mut queue = Queue::new();

        let report = clear_session(&mut queue, &store, &settings).unwrap();

        assert_eq!(report.staged_entries_removed, 0);
        assert!(settings.download_dir.join("keep.mp4").exists());
    }

    #[test]
    fn test_clear_session_keeps_download_dir_nested_in_staging() {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings::defaults(temp.path());
        settings.staging_dir = temp.path().join("stage");
        settings.download_dir = settings.staging_dir.join("done");
        write(&settings.download_dir.join("keep.mp4"), "k");
        let store = FileQueueStore::new(temp.path().join("queue.txt"));

        let report = clear_session(&mut Queue::new(), &store, &settings).unwrap();

        assert_eq!(report.staged_entries_removed, 0);
        assert!(settings.download_dir.join("keep.mp4").exists());
    }
}
