//! Error types used by the taskmill runtime and tasks.
//!
//! This module defines three error types:
//!
//! - [`RuntimeError`] — errors raised by the manager/scheduler machinery itself.
//! - [`TaskError`] — errors raised by individual task execution attempts.
//! - [`RetryError`] — the accumulated record of a failed retry sequence.
//!
//! [`RuntimeError`] and [`TaskError`] provide `as_label` helpers for
//! logging/metrics, and [`TaskError::is_retryable`] drives the retry
//! short-circuit in the task handler.

use std::time::{Duration, Instant};

use thiserror::Error;

/// # Errors produced by the taskmill runtime.
///
/// These represent static failures of the orchestration machinery:
/// invalid configuration, submitting work to a stopped manager, or
/// scheduling an entry that carries no due instant.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The manager was configured with zero workers.
    #[error("invalid configuration: at least one worker must be specified")]
    NoWorkers,

    /// Work was submitted while the manager is not running.
    #[error("the task manager is not running")]
    Stopped,

    /// A scheduled entry has no due instant.
    #[error("cannot schedule a task without a due instant")]
    Unschedulable,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskmill::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::Stopped.as_label(), "manager_stopped");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NoWorkers => "no_workers",
            RuntimeError::Stopped => "manager_stopped",
            RuntimeError::Unschedulable => "unschedulable",
        }
    }
}

/// # Errors produced by task execution.
///
/// These represent failures of a single execution attempt. Every variant
/// except [`TaskError::Fatal`] is considered transient and is retried while
/// the handler has budget left; `Fatal` is the caller-facing "do not retry"
/// wrapper and short-circuits the retry loop.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The attempt exceeded its configured timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable error; the handler returns it without retrying.
    #[error("fatal error (no retry): {reason}")]
    Fatal {
        /// The underlying error message.
        reason: String,
    },

    /// The attempt failed but may succeed if retried.
    #[error("execution failed: {reason}")]
    Fail {
        /// The underlying error message.
        reason: String,
    },

    /// The execution context was cancelled.
    ///
    /// A cancelled base context is still charged against the retry budget:
    /// subsequent attempts will observe the same cancelled context and fail
    /// until the budget is spent.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Creates a transient failure from any displayable reason.
    pub fn fail(reason: impl Into<String>) -> Self {
        TaskError::Fail {
            reason: reason.into(),
        }
    }

    /// Tags an error as "do not retry".
    ///
    /// The handler unwraps and reports a `Fatal` error immediately,
    /// regardless of the remaining retry budget.
    pub fn fatal(reason: impl Into<String>) -> Self {
        TaskError::Fatal {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Indicates whether the error is safe to retry.
    ///
    /// Returns `false` only for [`TaskError::Fatal`]. Timeouts and cancelled
    /// contexts stay retryable so that a per-attempt timeout does not consume
    /// the whole budget and a cancelled context drains it predictably.
    ///
    /// # Example
    /// ```
    /// use taskmill::TaskError;
    ///
    /// assert!(TaskError::fail("boom").is_retryable());
    /// assert!(!TaskError::fatal("nope").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TaskError::Fatal { .. })
    }
}

/// # Accumulated record of a failed retry sequence.
///
/// Tracks the user-supplied terminal error (if any), the number of attempts
/// made, the error returned by each attempt, and the wall-clock time elapsed
/// since the task was first enqueued.
///
/// Rendered as `"after N attempts: <cause>"` when a terminal error was
/// supplied via [`TaskOptions::with_error`](crate::TaskOptions::with_error),
/// or `"task failed after N attempts"` otherwise.
#[derive(Debug, Default)]
pub struct RetryError {
    wrapped: Option<Box<dyn std::error::Error + Send + Sync>>,
    attempts: u32,
    causes: Vec<TaskError>,
    duration: Duration,
}

impl RetryError {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record that wraps a user-supplied terminal error.
    pub fn wrapping(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self {
            wrapped: Some(err),
            ..Self::default()
        }
    }

    /// Adds one attempt failure to the record and increments the attempt count.
    pub fn record(&mut self, cause: TaskError) {
        self.attempts += 1;
        self.causes.push(cause);
    }

    /// Sets the elapsed duration to the time since `started`.
    pub fn since(&mut self, started: Instant) {
        self.duration = started.elapsed();
    }

    /// Number of failed attempts recorded so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The error returned by each failed attempt, oldest first.
    pub fn causes(&self) -> &[TaskError] {
        &self.causes
    }

    /// Wall-clock time between enqueue and the last recorded failure.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns true if `cause` was recorded by any attempt.
    pub fn has_cause(&self, cause: &TaskError) -> bool {
        self.causes.iter().any(|c| c == cause)
    }
}

impl std::fmt::Display for RetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.wrapped {
            Some(err) => write!(f, "after {} attempts: {}", self.attempts, err),
            None => write!(f, "task failed after {} attempts", self.attempts),
        }
    }
}

impl std::error::Error for RetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.wrapped
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
