//! # Per-task configuration applied when work is submitted.
//!
//! [`TaskOptions`] travels with a task through
//! [`TaskManager::queue`](crate::TaskManager::queue) /
//! [`delay`](crate::TaskManager::delay) / [`schedule`](crate::TaskManager::schedule)
//! and configures the retry budget, backoff strategy, base context, and
//! per-attempt timeout for that one submission.
//!
//! ## Context vs. timeout
//! The base `context` is reused across every retry of the task. Do **not**
//! hand in a context with a hard deadline when also configuring retries: the
//! deadline may expire mid-sequence and fail all remaining attempts. Use
//! `timeout` instead, which scopes a fresh deadline to each attempt.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::backoff::BackOff;

/// Options for a single task submission.
///
/// Built with `Default` plus the `with_*` methods:
///
/// ```rust
/// use std::time::Duration;
/// use taskmill::{BackOff, TaskOptions};
///
/// let opts = TaskOptions::default()
///     .with_retries(3)
///     .with_backoff(BackOff::constant(Duration::from_millis(100)))
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(opts.retries, 3);
/// ```
#[derive(Debug, Default)]
pub struct TaskOptions {
    /// How many times a failing task is retried (default 0: one attempt).
    pub retries: u32,

    /// Delay strategy between retries.
    ///
    /// When retries are requested and no strategy is given, the default
    /// exponential backoff is used.
    pub backoff: Option<BackOff>,

    /// Base cancellation context, reused across all attempts.
    ///
    /// Cancelling it makes every remaining attempt fail until the retry
    /// budget is spent.
    pub context: Option<CancellationToken>,

    /// Per-attempt timeout; each attempt gets a fresh deadline.
    pub timeout: Option<Duration>,

    /// A terminal error reported alongside the attempt failures when the
    /// task never succeeds; see [`RetryError`](crate::RetryError).
    pub error: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TaskOptions {
    /// Sets the number of retries after a failed first attempt.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the backoff strategy used to space retries.
    pub fn with_backoff(mut self, backoff: BackOff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Sets the base context shared by all attempts.
    pub fn with_context(mut self, context: CancellationToken) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches a terminal error that describes the overall failure.
    ///
    /// It is bundled with the per-attempt causes when the retry budget is
    /// spent and rendered as `"after N attempts: <error>"`.
    pub fn with_error(mut self, error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a terminal error built from a plain message.
    pub fn with_error_msg(mut self, msg: impl Into<String>) -> Self {
        self.error = Some(msg.into().into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = TaskOptions::default();
        assert_eq!(opts.retries, 0);
        assert!(opts.backoff.is_none());
        assert!(opts.context.is_none());
        assert!(opts.timeout.is_none());
        assert!(opts.error.is_none());
    }

    #[test]
    fn test_builders_compose() {
        let token = CancellationToken::new();
        let opts = TaskOptions::default()
            .with_retries(2)
            .with_backoff(BackOff::zero())
            .with_context(token.clone())
            .with_timeout(Duration::from_millis(250))
            .with_error_msg("inventory sync failed");

        assert_eq!(opts.retries, 2);
        assert!(matches!(opts.backoff, Some(BackOff::Zero)));
        assert_eq!(opts.timeout, Some(Duration::from_millis(250)));
        assert_eq!(
            opts.error.unwrap().to_string(),
            "inventory sync failed"
        );
    }
}
