//! Queue processor: drains the queue one URL at a time through the external tool.
//!
//! # Overview
//!
//! For each head-of-queue URL the [`QueueProcessor`]:
//! 1. validates the URL shape and, optionally, probes it
//! 2. runs the tool up to [`MAX_ATTEMPTS`](super::MAX_ATTEMPTS) times with a
//!    fixed wait between failures
//! 3. pops the URL and persists the queue, whatever the outcome
//!
//! When staging is enabled, the staged output is relocated into the final
//! directory once the queue is empty.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use ytqueue_core::{
//!     FileQueueStore, InterruptibleWait, ProcessRunner, QueueProcessor, QueueStore,
//!     SessionEvent, SessionObserver, Settings,
//! };
//!
//! struct Quiet;
//! impl SessionObserver for Quiet {
//!     fn on_event(&mut self, _event: &SessionEvent) {}
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let home = Path::new("/home/ada");
//! let settings = Settings::defaults(home);
//! let store = FileQueueStore::new("/home/ada/.config/ytqueue/queue.txt");
//! let mut queue = store.load()?;
//! let waiter = InterruptibleWait::listen();
//! let processor = QueueProcessor::new(&settings, home, &ProcessRunner, &waiter);
//! let outcome = processor.run(&mut queue, &store, &mut Quiet).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::error::{ProcessorError, RunnerError};
use super::relocate::{self, RelocationReport};
use super::retry::{FailureKind, RetryDecision, RetryPolicy, WaitOutcome, Waiter, classify_failure};
use super::runner::{Invocation, ToolRunner};
use super::validation::{LinkProbe, ProbeOutcome, UrlCheck, check_url_shape};
use crate::paths;
use crate::queue::{Queue, QueueStore};
use crate::settings::Settings;

/// How tool output should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Condense progress into a single status line.
    StatusLine,
    /// Forward raw tool output.
    PassThrough,
}

impl OutputMode {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.suppress_output {
            Self::StatusLine
        } else {
            Self::PassThrough
        }
    }
}

/// The URL currently being downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAttempt {
    pub url: String,
    /// 1-indexed attempt number.
    pub attempt: u32,
    /// Short error text of the previous failed attempt.
    pub last_error: Option<String>,
    /// Directory the tool runs in.
    pub target_dir: PathBuf,
}

/// Progress notifications emitted during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Processing begins.
    SessionStarted {
        pending: usize,
        target_dir: PathBuf,
        final_dir: PathBuf,
        staging: bool,
        mode: OutputMode,
    },
    /// Head URL is being validated.
    Checking { url: String },
    /// Head URL failed validation and was removed.
    Dropped { url: String, check: UrlCheck },
    /// A tool invocation is starting.
    AttemptStarted {
        attempt: DownloadAttempt,
        command_line: String,
    },
    /// An attempt failed and another will follow after `delay`.
    Retrying {
        url: String,
        next_attempt: u32,
        kind: FailureKind,
        delay: Duration,
        error: String,
    },
    /// The tool exited successfully.
    Finished { url: String, attempts: u32 },
    /// Every attempt failed; the URL was removed.
    Abandoned {
        url: String,
        attempts: u32,
        last_error: Option<String>,
    },
    /// The operator interrupted a retry wait; `url` stays queued.
    Interrupted { url: String },
    /// Staged output was moved into the final directory.
    Relocated {
        report: RelocationReport,
        final_dir: PathBuf,
    },
}

/// Receives session events and raw tool output.
pub trait SessionObserver: Send {
    fn on_event(&mut self, event: &SessionEvent);

    /// Called for every line of tool output.
    fn on_output(&mut self, line: &str) {
        let _ = line;
    }
}

/// Totals for a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// URLs the tool downloaded successfully.
    pub completed: Vec<String>,
    /// URLs dropped after exhausting attempts.
    pub abandoned: Vec<String>,
    /// URLs dropped by the shape check.
    pub invalid: Vec<String>,
    /// URLs dropped by the liveness probe.
    pub unreachable: Vec<String>,
    /// Total tool invocations.
    pub invocations: u32,
    /// Relocation result, when staging was used and the queue drained.
    pub relocation: Option<RelocationReport>,
    /// The default staging directory was removed afterwards.
    pub staging_removed: bool,
}

impl RunSummary {
    /// URLs removed from the queue without a successful download.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.abandoned.len() + self.invalid.len() + self.unreachable.len()
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The queue was empty; nothing was touched.
    NothingToDo,
    /// The queue was drained.
    Completed(RunSummary),
    /// A retry wait was interrupted; the head URL is still queued.
    Interrupted(RunSummary),
}

enum UrlResult {
    Downloaded,
    Abandoned,
    Interrupted,
}

/// Drains a [`Queue`] through a [`ToolRunner`].
pub struct QueueProcessor<'a> {
    settings: &'a Settings,
    home: &'a Path,
    runner: &'a dyn ToolRunner,
    probe: Option<&'a dyn LinkProbe>,
    waiter: &'a dyn Waiter,
    policy: RetryPolicy,
}

impl<'a> QueueProcessor<'a> {
    /// Creates a processor with no link probe and a policy of
    /// three attempts separated by the configured retry delay.
    #[must_use]
    pub fn new(
        settings: &'a Settings,
        home: &'a Path,
        runner: &'a dyn ToolRunner,
        waiter: &'a dyn Waiter,
    ) -> Self {
        Self {
            settings,
            home,
            runner,
            probe: None,
            waiter,
            policy: RetryPolicy::with_delay(settings.retry_delay()),
        }
    }

    /// Probes each URL before invoking the tool, when `check_links` is set.
    #[must_use]
    pub fn with_probe(mut self, probe: &'a dyn LinkProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Processes the queue until it is empty or the operator interrupts.
    ///
    /// The queue is persisted through `store` after every removal.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError`] if the target directory cannot be prepared,
    /// the tool is not installed, the queue cannot be saved or relocation
    /// fails. The queue is left as last persisted.
    #[instrument(skip_all, fields(pending = queue.len(), staging = self.settings.use_staging))]
    pub async fn run(
        &self,
        queue: &mut Queue,
        store: &dyn QueueStore,
        observer: &mut dyn SessionObserver,
    ) -> Result<SessionOutcome, ProcessorError> {
        if queue.is_empty() {
            debug!("queue is empty, nothing to do");
            return Ok(SessionOutcome::NothingToDo);
        }

        let target_dir = self.prepare_target()?;
        info!(target = %target_dir.display(), "starting queue processing");
        observer.on_event(&SessionEvent::SessionStarted {
            pending: queue.len(),
            target_dir: target_dir.clone(),
            final_dir: self.settings.download_dir.clone(),
            staging: self.settings.use_staging,
            mode: OutputMode::from_settings(self.settings),
        });

        let mut summary = RunSummary::default();
        while let Some(url) = queue.front().map(str::to_string) {
            if self.waiter.interrupt_requested() {
                info!(%url, "interrupted, leaving URL queued");
                observer.on_event(&SessionEvent::Interrupted { url });
                return Ok(SessionOutcome::Interrupted(summary));
            }
            observer.on_event(&SessionEvent::Checking { url: url.clone() });
            let check = self.check(&url).await;
            if !check.is_valid() {
                info!(%url, ?check, "dropping URL");
                pop_and_persist(queue, store)?;
                if matches!(check, UrlCheck::Invalid { .. }) {
                    summary.invalid.push(url.clone());
                } else {
                    summary.unreachable.push(url.clone());
                }
                observer.on_event(&SessionEvent::Dropped { url, check });
                continue;
            }

            match self.download(&url, &target_dir, observer, &mut summary).await? {
                UrlResult::Downloaded => {
                    pop_and_persist(queue, store)?;
                    summary.completed.push(url);
                }
                UrlResult::Abandoned => {
                    pop_and_persist(queue, store)?;
                    summary.abandoned.push(url);
                }
                UrlResult::Interrupted => {
                    info!(%url, "interrupted, leaving URL queued");
                    observer.on_event(&SessionEvent::Interrupted { url });
                    return Ok(SessionOutcome::Interrupted(summary));
                }
            }
        }

        if self.settings.use_staging {
            let final_dir = &self.settings.download_dir;
            let report = relocate::relocate_staged(&self.settings.staging_dir, final_dir)?;
            relocate::clear_session(queue, store, self.settings)?;
            summary.staging_removed =
                relocate::remove_default_staging_if_empty(self.settings, self.home)?;
            observer.on_event(&SessionEvent::Relocated {
                report: report.clone(),
                final_dir: final_dir.clone(),
            });
            summary.relocation = Some(report);
        }

        info!(
            completed = summary.completed.len(),
            dropped = summary.dropped(),
            invocations = summary.invocations,
            "queue processing finished"
        );
        Ok(SessionOutcome::Completed(summary))
    }

    fn prepare_target(&self) -> Result<PathBuf, ProcessorError> {
        let settings = self.settings;
        if settings.use_staging && paths::is_within(&settings.download_dir, &settings.staging_dir) {
            return Err(ProcessorError::FinalInsideStaging {
                final_dir: settings.download_dir.clone(),
                staging: settings.staging_dir.clone(),
            });
        }
        let target = settings.target_dir().to_path_buf();
        if let Err(source) = fs::create_dir_all(&target) {
            if self.settings.use_staging {
                return Err(ProcessorError::StagingCreate { path: target, source });
            }
            warn!(path = %target.display(), error = %source, "cannot create download directory");
            return Err(ProcessorError::TargetNotWritable { path: target });
        }
        if !paths::is_writable_dir(&target) {
            return Err(ProcessorError::TargetNotWritable { path: target });
        }
        Ok(target)
    }

    async fn check(&self, url: &str) -> UrlCheck {
        if self.settings.validate_urls {
            let shape = check_url_shape(url);
            if !shape.is_valid() {
                return shape;
            }
        }
        if self.settings.check_links
            && let Some(probe) = self.probe
        {
            let outcome = probe.probe(url).await;
            if outcome != ProbeOutcome::Responsive && !outcome.is_network_failure() {
                warn!(%url, ?outcome, "link probe did not succeed, dropping URL");
            }
            return outcome.into_check();
        }
        UrlCheck::Valid
    }

    async fn download(
        &self,
        url: &str,
        target_dir: &Path,
        observer: &mut dyn SessionObserver,
        summary: &mut RunSummary,
    ) -> Result<UrlResult, ProcessorError> {
        let invocation = Invocation::for_url(self.settings, url);
        let mut attempt = DownloadAttempt {
            url: url.to_string(),
            attempt: 1,
            last_error: None,
            target_dir: target_dir.to_path_buf(),
        };

        loop {
            observer.on_event(&SessionEvent::AttemptStarted {
                attempt: attempt.clone(),
                command_line: invocation.command_line(),
            });
            summary.invocations += 1;

            let mut forward = |line: &str| observer.on_output(line);
            let result = tokio::select! {
                result = self.runner.run(&invocation, &mut forward) => result,
                () = self.waiter.interrupted() => {
                    warn!(%url, attempt = attempt.attempt, "interrupted while the tool was running");
                    return Ok(UrlResult::Interrupted);
                }
            };
            let (kind, error) = match result {
                Ok(outcome) if outcome.success => {
                    info!(%url, attempts = attempt.attempt, "download finished");
                    observer.on_event(&SessionEvent::Finished {
                        url: url.to_string(),
                        attempts: attempt.attempt,
                    });
                    return Ok(UrlResult::Downloaded);
                }
                Ok(outcome) => {
                    let error = outcome.last_line().map_or_else(
                        || match outcome.exit_code {
                            Some(code) => format!("tool exited with status {code}"),
                            None => "tool terminated by signal".to_string(),
                        },
                        str::to_string,
                    );
                    (classify_failure(&outcome.output), error)
                }
                Err(error @ RunnerError::NotFound { .. }) => {
                    return Err(ProcessorError::ToolUnavailable(error));
                }
                Err(error) => (FailureKind::Other, error.to_string()),
            };
            warn!(%url, attempt = attempt.attempt, ?kind, %error, "download attempt failed");
            attempt.last_error = Some(error.clone());

            match self.policy.should_retry(kind, attempt.attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    observer.on_event(&SessionEvent::Retrying {
                        url: url.to_string(),
                        next_attempt,
                        kind,
                        delay,
                        error,
                    });
                    if self.waiter.wait(delay).await == WaitOutcome::Interrupted {
                        return Ok(UrlResult::Interrupted);
                    }
                    attempt.attempt = next_attempt;
                }
                RetryDecision::GiveUp { reason } => {
                    warn!(%url, %reason, "giving up on URL");
                    observer.on_event(&SessionEvent::Abandoned {
                        url: url.to_string(),
                        attempts: attempt.attempt,
                        last_error: attempt.last_error.take(),
                    });
                    return Ok(UrlResult::Abandoned);
                }
            }
        }
    }
}

fn pop_and_persist(queue: &mut Queue, store: &dyn QueueStore) -> Result<(), ProcessorError> {
    queue.pop_front();
    store.save(queue)?;
    Ok(())
}
