//! Fixed-delay retry policy for failed tool invocations.
//!
//! This module provides the [`RetryPolicy`] and [`FailureKind`] types for
//! classifying tool failures and deciding whether to try the same URL again.
//!
//! # Overview
//!
//! When an invocation fails, its captured output is classified:
//! - [`FailureKind::RateLimited`] - The site throttled us or asked for a bot check
//! - [`FailureKind::Other`] - Anything else
//!
//! Both kinds wait the same configured delay before the next attempt. The
//! delay does not grow between attempts.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use ytqueue_core::download::{FailureKind, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(60));
//! assert_eq!(
//!     policy.should_retry(FailureKind::Other, 1),
//!     RetryDecision::Retry { delay: Duration::from_secs(60), attempt: 2 }
//! );
//! assert!(matches!(
//!     policy.should_retry(FailureKind::RateLimited, 3),
//!     RetryDecision::GiveUp { .. }
//! ));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::constants::MAX_ATTEMPTS;

/// Output patterns that mark a throttled or bot-checked request.
#[allow(clippy::expect_used)]
static RATE_LIMIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(http error 429|too many requests|sign in to confirm you.?re not a bot|rate.?limit)",
    )
    .expect("rate-limit regex is valid") // Static pattern, safe to panic
});

/// Classification of a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Site throttling or bot check.
    RateLimited,
    /// Any other non-zero exit.
    Other,
}

/// Classifies captured tool output.
#[must_use]
pub fn classify_failure(output: &str) -> FailureKind {
    if RATE_LIMIT_PATTERN.is_match(output) {
        FailureKind::RateLimited
    } else {
        FailureKind::Other
    }
}

/// Decision after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay`, then run attempt number `attempt`.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },
    /// Stop trying this URL.
    GiveUp {
        /// Human-readable reason.
        reason: String,
    },
}

/// Bounded attempts with a fixed delay between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delay: Duration::from_secs(15 * 60),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Three attempts with the given delay.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self::new(MAX_ATTEMPTS, delay)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Decides what follows failed attempt number `attempt` (1-indexed).
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, kind: FailureKind, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            debug!(attempt, "max attempts reached");
            return RetryDecision::GiveUp {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }
        if kind == FailureKind::RateLimited {
            warn!(attempt, "rate limited or bot check requested");
        }
        RetryDecision::Retry {
            delay: self.delay,
            attempt: attempt + 1,
        }
    }
}

/// How a retry wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full delay passed.
    Elapsed,
    /// The operator asked to stop.
    Interrupted,
}

/// Waits between attempts and reports operator interrupts.
#[async_trait]
pub trait Waiter: Send + Sync {
    async fn wait(&self, delay: Duration) -> WaitOutcome;

    /// Resolves once the operator asks the session to stop.
    ///
    /// The default never resolves.
    async fn interrupted(&self) {
        std::future::pending::<()>().await;
    }

    /// True when an interrupt has already been requested.
    fn interrupt_requested(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct InterruptState {
    requested: AtomicBool,
    notify: Notify,
}

impl InterruptState {
    fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    async fn requested(&self) {
        loop {
            let notified = self.notify.notified();
            if self.requested.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

/// [`Waiter`] that sleeps but returns early on Ctrl-C.
///
/// A single listener covers the whole session, so an interrupt is seen
/// whether it arrives during a retry wait or while the tool is running.
#[derive(Debug)]
pub struct InterruptibleWait {
    state: Arc<InterruptState>,
    listener: Option<JoinHandle<()>>,
}

impl InterruptibleWait {
    /// Starts listening for Ctrl-C. Must be called inside a tokio runtime.
    #[must_use]
    pub fn listen() -> Self {
        let state = Arc::new(InterruptState::default());
        let shared = Arc::clone(&state);
        let listener = tokio::spawn(async move {
            loop {
                if let Err(error) = tokio::signal::ctrl_c().await {
                    warn!(%error, "cannot listen for Ctrl-C");
                    return;
                }
                info!("interrupt requested");
                shared.request();
            }
        });
        Self {
            state,
            listener: Some(listener),
        }
    }

    /// A waiter with no signal listener; only [`Self::interrupt`] stops it.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            state: Arc::new(InterruptState::default()),
            listener: None,
        }
    }

    /// Requests an interrupt as if Ctrl-C had been pressed.
    pub fn interrupt(&self) {
        self.state.request();
    }
}

impl Drop for InterruptibleWait {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

#[async_trait]
impl Waiter for InterruptibleWait {
    async fn wait(&self, delay: Duration) -> WaitOutcome {
        if self.interrupt_requested() {
            return WaitOutcome::Interrupted;
        }
        if delay.is_zero() {
            return WaitOutcome::Elapsed;
        }
        tokio::select! {
            () = tokio::time::sleep(delay) => WaitOutcome::Elapsed,
            () = self.state.requested() => WaitOutcome::Interrupted,
        }
    }

    async fn interrupted(&self) {
        self.state.requested().await;
    }

    fn interrupt_requested(&self) -> bool {
        self.state.requested.load(Ordering::SeqCst)
    }
}
