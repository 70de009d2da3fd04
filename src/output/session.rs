//! Console rendering of a download session.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use ytqueue_core::download::ProgressTracker;
use ytqueue_core::{OutputMode, RunSummary, SessionEvent, SessionObserver, UrlCheck};

use super::{format_delay, on_off, terminal_width, truncate_to_width};

/// Prints session events to stdout and keeps the condensed status line.
pub(crate) struct ConsoleObserver {
    mode: OutputMode,
    interactive: bool,
    quiet: bool,
    max_attempts: u32,
    tracker: ProgressTracker,
    status: Option<ProgressBar>,
}

impl ConsoleObserver {
    /// `interactive` enables the animated status line; without it progress
    /// lines are dropped in [`OutputMode::StatusLine`].
    pub(crate) fn new(mode: OutputMode, interactive: bool, quiet: bool, max_attempts: u32) -> Self {
        Self {
            mode,
            interactive,
            quiet,
            max_attempts,
            tracker: ProgressTracker::new(),
            status: None,
        }
    }

    fn say(&mut self, line: &str) {
        if self.quiet {
            return;
        }
        match &self.status {
            Some(status) => status.println(line),
            None => println!("{line}"),
        }
    }

    fn start_status(&mut self, message: String) {
        if self.mode != OutputMode::StatusLine || !self.interactive || self.quiet {
            return;
        }
        let status = ProgressBar::new_spinner();
        status.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        status.enable_steady_tick(Duration::from_millis(100));
        status.set_message(message);
        self.status = Some(status);
    }

    fn stop_status(&mut self) {
        if let Some(status) = self.status.take() {
            status.finish_and_clear();
        }
    }
}

impl Drop for ConsoleObserver {
    fn drop(&mut self) {
        self.stop_status();
    }
}

impl SessionObserver for ConsoleObserver {
    fn on_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::SessionStarted {
                pending,
                target_dir,
                final_dir,
                staging,
                mode,
            } => {
                self.mode = *mode;
                self.say(&format!(
                    "Suppression is {}.",
                    on_off(*mode == OutputMode::StatusLine)
                ));
                if *staging {
                    self.say(&format!(
                        "Temporary folder is enabled. Downloading to: {}",
                        target_dir.display()
                    ));
                    self.say(&format!("Final download folder is: {}", final_dir.display()));
                } else {
                    self.say(&format!("Downloading to: {}", target_dir.display()));
                }
                self.say(&format!("{pending} URL(s) in queue.\n"));
            }
            SessionEvent::Checking { url } => debug!(%url, "checking URL"),
            SessionEvent::Dropped { url, check } => {
                let reason: &str = match check {
                    UrlCheck::Valid => "valid",
                    UrlCheck::Invalid { reason } | UrlCheck::Unreachable { reason } => reason,
                };
                self.say(&format!("Skipping {url}: {reason}"));
            }
            SessionEvent::AttemptStarted {
                attempt,
                command_line,
            } => {
                debug!(%command_line, "invoking tool");
                self.tracker.reset();
                self.say(&format!(
                    "Downloading {} (attempt {}/{})",
                    attempt.url, attempt.attempt, self.max_attempts
                ));
                self.start_status("Starting yt-dlp".to_string());
            }
            SessionEvent::Retrying {
                url,
                next_attempt,
                delay,
                error,
                ..
            } => {
                self.stop_status();
                self.say(&format!("Download of {url} failed: {error}"));
                self.say(&format!(
                    "Retrying in {} (attempt {next_attempt}/{}). Press Ctrl-C to stop.",
                    format_delay(*delay),
                    self.max_attempts
                ));
            }
            SessionEvent::Finished { url, .. } => {
                self.stop_status();
                self.say(&format!("Finished {url}"));
            }
            SessionEvent::Abandoned {
                url,
                attempts,
                last_error,
            } => {
                self.stop_status();
                let detail = last_error.as_deref().unwrap_or("unknown error");
                self.say(&format!(
                    "Giving up on {url} after {attempts} attempt(s): {detail}"
                ));
            }
            SessionEvent::Interrupted { url } => {
                self.stop_status();
                self.say(&format!("Interrupted. {url} stays at the head of the queue."));
            }
            SessionEvent::Relocated { report, final_dir } => {
                if report.nothing_to_move() {
                    self.say("Nothing to move from the temporary folder.");
                } else {
                    self.say(&format!(
                        "Moved {} item(s) to {}",
                        report.moved.len(),
                        final_dir.display()
                    ));
                }
            }
        }
    }

    fn on_output(&mut self, line: &str) {
        match self.mode {
            OutputMode::PassThrough => {
                if !self.quiet {
                    println!("{line}");
                }
            }
            OutputMode::StatusLine => {
                if let Some(message) = self.tracker.observe(line)
                    && let Some(status) = &self.status
                {
                    status.set_message(truncate_to_width(&message, terminal_width().saturating_sub(2)));
                }
            }
        }
    }
}

/// Closing lines printed after a session.
pub(crate) fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Done: {} downloaded, {} dropped, {} yt-dlp run(s).",
        summary.completed.len(),
        summary.dropped(),
        summary.invocations
    )];
    for url in &summary.abandoned {
        lines.push(format!("  failed:      {url}"));
    }
    for url in &summary.invalid {
        lines.push(format!("  invalid:     {url}"));
    }
    for url in &summary.unreachable {
        lines.push(format!("  unreachable: {url}"));
    }
    lines
}
