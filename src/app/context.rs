//! Shared runtime context built after CLI parsing and config loading.

use std::fs;

use anyhow::{Context, Result};
use tracing::{debug, info};
use ytqueue_core::settings::parse_settings;
use ytqueue_core::{AppPaths, FileQueueStore, Queue, QueueStore, Settings, SettingsStore};

/// Holds the loaded state so command handlers can use `ctx.settings`,
/// `ctx.queue`, etc., instead of passing many arguments.
pub(crate) struct RunContext {
    pub(crate) paths: AppPaths,
    pub(crate) settings_store: SettingsStore,
    pub(crate) settings: Settings,
    pub(crate) queue_store: FileQueueStore,
    pub(crate) queue: Queue,
    pub(crate) quiet: bool,
}

impl RunContext {
    /// Creates the config directory if needed and loads settings and queue.
    pub(crate) fn load(paths: AppPaths, quiet: bool) -> Result<Self> {
        if paths.ensure_config_dir()? {
            info!(dir = %paths.config_dir().display(), "created config directory");
        }

        let settings_store = SettingsStore::new(paths.settings_file(), paths.home());
        let loaded = settings_store
            .load()
            .context("cannot load settings")?;
        if loaded.regenerated {
            info!(path = %settings_store.path().display(), "wrote default settings");
        }

        let queue_store = FileQueueStore::new(paths.queue_file());
        queue_store.ensure_exists()?;
        let queue = queue_store.load()?;
        debug!(pending = queue.len(), "queue loaded");

        Ok(Self {
            paths,
            settings_store,
            settings: loaded.settings,
            queue_store,
            queue,
            quiet,
        })
    }

    /// Persists the current settings.
    pub(crate) fn save_settings(&self) -> Result<()> {
        self.settings_store
            .save(&self.settings)
            .context("cannot save settings")
    }

    /// Persists the current queue.
    pub(crate) fn save_queue(&self) -> Result<()> {
        self.queue_store
            .save(&self.queue)
            .context("cannot save queue")
    }
}

/// Reads the `debug` setting without repairing the file, so the log level
/// can be chosen before the store logs anything.
pub(crate) fn debug_setting_hint(paths: &AppPaths) -> bool {
    fs::read_to_string(paths.settings_file())
        .map(|raw| parse_settings(&raw, paths.home()).settings.debug)
        .unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(temp: &TempDir) -> AppPaths {
        AppPaths::new(temp.path(), temp.path().join("config/ytqueue"))
    }

    #[test]
    fn test_load_creates_config_files() {
        let temp = TempDir::new().unwrap();
        let ctx = RunContext::load(paths(&temp), false).unwrap();

        assert!(ctx.paths.settings_file().is_file());
        assert!(ctx.paths.queue_file().is_file());
        assert!(ctx.queue.is_empty());
        assert_eq!(ctx.settings, Settings::defaults(temp.path()));
    }

    #[test]
    fn test_debug_setting_hint() {
        let temp = TempDir::new().unwrap();
        let paths = paths(&temp);
        assert!(!debug_setting_hint(&paths));

        fs::create_dir_all(paths.config_dir()).unwrap();
        fs::write(paths.settings_file(), "[yt-dlp]\ndebug=True\n").unwrap();
        assert!(debug_setting_hint(&paths));
    }
}
