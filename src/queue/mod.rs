//! Queue module for the ordered list of URLs awaiting download.
//!
//! # Overview
//!
//! The queue system consists of:
//! - [`Queue`] - In-memory FIFO of URL strings
//! - [`QueueStore`] - Persistence seam, rewritten in full after every mutation
//! - [`FileQueueStore`] - One-URL-per-line file implementation
//! - [`QueueError`] - Operation error types
//!
//! # Example
//!
//! ```no_run
//! use ytqueue_core::queue::{FileQueueStore, QueueStore};
//!
//! # fn example() -> Result<(), ytqueue_core::QueueError> {
//! let store = FileQueueStore::new("/home/ada/.config/ytqueue/queue.txt");
//! let mut queue = store.load()?;
//! queue.push_back("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
//! store.save(&queue)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod store;

pub use error::QueueError;
pub use store::{FileQueueStore, parse_queue, render_queue};

use std::collections::VecDeque;

/// Persistence for a [`Queue`].
///
/// Implementations rewrite the whole queue on every `save`.
pub trait QueueStore {
    /// Loads the persisted queue. A missing store yields an empty queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Read`] if the backing storage cannot be read.
    fn load(&self) -> Result<Queue, QueueError>;

    /// Replaces the persisted queue with `queue`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Write`] if the backing storage cannot be written.
    fn save(&self, queue: &Queue) -> Result<(), QueueError>;
}

/// Ordered URLs, processed front to back.
///
/// Duplicates are allowed; insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Queue {
    entries: VecDeque<String>,
}

impl Queue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a queue from entries, skipping blank ones.
    #[must_use]
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(Into::into)
                .filter(|entry| !entry.trim().is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Head of the queue without removing it.
    #[must_use]
    pub fn front(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Appends a URL to the tail.
    pub fn push_back(&mut self, url: impl Into<String>) {
        self.entries.push_back(url.into());
    }

    pub fn pop_front(&mut self) -> Option<String> {
        self.entries.pop_front()
    }

    /// Removes the entry at a zero-based index.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::IndexOutOfRange`] without mutating the queue.
    pub fn remove(&mut self, index: usize) -> Result<String, QueueError> {
        let len = self.entries.len();
        self.entries
            .remove(index)
            .ok_or(QueueError::IndexOutOfRange { index, len })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = Queue::new();
        queue.push_back("a");
        queue.push_back("b");
        assert_eq!(queue.front(), Some("a"));
        assert_eq!(queue.pop_front().as_deref(), Some("a"));
        assert_eq!(queue.pop_front().as_deref(), Some("b"));
        assert!(queue.pop_front().is_none());
    }

    #[test]
    fn test_queue_allows_duplicates() {
        let mut queue = Queue::new();
        queue.push_back("a");
        queue.push_back("a");
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_remove_by_index() {
        let mut queue = Queue::from_entries(["a", "b", "c"]);
        assert_eq!(queue.remove(1).unwrap(), "b");
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_remove_out_of_range_does_not_mutate() {
        let mut queue = Queue::from_entries(["a"]);
        let err = queue.remove(1).unwrap_err();
        assert!(matches!(err, QueueError::IndexOutOfRange { index: 1, len: 1 }));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_from_entries_skips_blank() {
        let queue = Queue::from_entries(["a", "", "   ", "b"]);
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
