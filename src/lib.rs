//! ytqueue Core Library
//!
//! This library provides the core functionality for the `ytqueue` tool,
//! a persistent download queue that drives an external media downloader
//! (`yt-dlp` by default) one URL at a time.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`paths`] - Config directory resolution and `~` expansion
//! - [`settings`] - Key/value settings store under the `[yt-dlp]` section
//! - [`queue`] - Ordered URL queue and its line-oriented file store
//! - [`download`] - Queue processing loop, retries, staging and relocation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod paths;
pub mod queue;
pub mod settings;

// Re-export commonly used types
pub use download::{
    ARCHIVE_FILE_NAME, DownloadAttempt, FailureKind, HttpLinkProbe, InterruptibleWait,
    Invocation, LinkProbe, MAX_ATTEMPTS, OutputMode, ProcessRunner, ProcessorError,
    QueueProcessor, RetryDecision, RetryPolicy, RunOutcome, RunSummary, RunnerError,
    SessionEvent, SessionObserver, SessionOutcome, ToolRunner, UrlCheck, WaitOutcome, Waiter,
    clear_session,
};
pub use paths::{AppPaths, PathsError};
pub use queue::{FileQueueStore, Queue, QueueError, QueueStore};
pub use settings::{LoadedSettings, Settings, SettingsError, SettingsStore};
