//! Download session: runs the external tool for each queued URL.
//!
//! This module owns the queue processing loop and its collaborators. No
//! media is fetched here; every download is delegated to the external tool.
//!
//! # Features
//!
//! - URL shape validation and an optional bounded-timeout liveness probe
//! - Bounded attempts with a fixed, interruptible wait between failures
//! - Combined stdout/stderr streaming with a condensed status line
//! - Staging directory with relocation into the final directory
//!
//! See [`QueueProcessor`] for an end-to-end example.

mod constants;
mod error;
mod processor;
mod progress;
mod relocate;
mod retry;
mod runner;
mod validation;

pub use constants::{ARCHIVE_FILE_NAME, LINK_PROBE_TIMEOUT, MAX_ATTEMPTS, RECOGNIZED_HOSTS};
pub use error::{ProcessorError, RelocateError, RunnerError};
pub use processor::{
    DownloadAttempt, OutputMode, QueueProcessor, RunSummary, SessionEvent, SessionObserver,
    SessionOutcome,
};
pub use progress::{ProgressDetails, ProgressTracker, is_merge_line, is_progress_line};
pub use relocate::{
    ClearReport, RelocationReport, clear_session, purge_staging, relocate_staged,
    remove_default_staging_if_empty,
};
pub use retry::{
    FailureKind, InterruptibleWait, RetryDecision, RetryPolicy, WaitOutcome, Waiter,
    classify_failure,
};
pub use runner::{Invocation, LineSplitter, ProcessRunner, RunOutcome, ToolRunner};
pub use validation::{HttpLinkProbe, LinkProbe, ProbeOutcome, UrlCheck, check_url_shape};

// Note: no module-local Result alias. Use `Result<T, ProcessorError>` explicitly.
