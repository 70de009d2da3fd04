//! Line-oriented file store for the queue.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use super::{Queue, QueueError, QueueStore};

/// Parses queue text: one URL per line, surrounding whitespace and blank lines ignored.
#[must_use]
pub fn parse_queue(raw: &str) -> Queue {
    Queue::from_entries(raw.lines().map(str::trim))
}

/// Renders a queue as one URL per line, each line newline-terminated.
#[must_use]
pub fn render_queue(queue: &Queue) -> String {
    let mut out = String::new();
    for url in queue.iter() {
        out.push_str(url);
        out.push('\n');
    }
    out
}

/// Queue persisted as a text file.
#[derive(Debug, Clone)]
pub struct FileQueueStore {
    path: PathBuf,
}

impl FileQueueStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates an empty queue file when none exists. Returns `true` when created.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Write`] if the file cannot be created.
    pub fn ensure_exists(&self) -> Result<bool, QueueError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&Queue::new())?;
        Ok(true)
    }
}

impl QueueStore for FileQueueStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Queue, QueueError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let queue = parse_queue(&raw);
                debug!(entries = queue.len(), "queue loaded");
                Ok(queue)
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Queue::new()),
            Err(source) => Err(QueueError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    #[instrument(skip(self, queue), fields(path = %self.path.display(), entries = queue.len()))]
    fn save(&self, queue: &Queue) -> Result<(), QueueError> {
        let to_error = |source| QueueError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(to_error)?;
        }
        fs::write(&self.path, render_queue(queue)).map_err(to_error)?;
        debug!("queue saved");
        Ok(())
    }
}
