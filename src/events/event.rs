//! # Runtime events emitted by the manager, workers, and retry handlers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Manager lifecycle**: start/stop of the worker pool.
//! - **Attempt lifecycle**: execution flow of a single attempt
//!   (starting, completed, failed, timeout).
//! - **Retry outcomes**: a retry being scheduled, the budget being
//!   exhausted, or a non-retryable error aborting the sequence.
//!
//! The [`Event`] struct carries optional metadata such as the task name,
//! attempt number, failure reason, and backoff delay.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Manager lifecycle ===
    /// The manager started its scheduler, dispatcher, and worker pool.
    ///
    /// Sets: `at`, `seq`.
    ManagerStarted,

    /// The manager stopped; in-flight work was drained first.
    ///
    /// Sets: `at`, `seq`.
    ManagerStopped,

    // === Attempt lifecycle ===
    /// A worker is starting an execution attempt.
    ///
    /// Sets: `task`, `attempt` (1-based), `at`, `seq`.
    TaskStarting,

    /// An attempt finished successfully; the handler is done.
    ///
    /// Sets: `task`, `attempt`, `at`, `seq`.
    TaskCompleted,

    /// An attempt failed with a transient error.
    ///
    /// Sets: `task`, `attempt`, `reason`, `at`, `seq`.
    TaskFailed,

    /// An attempt exceeded its configured timeout.
    ///
    /// Sets: `task`, `attempt`, `timeout_ms`, `at`, `seq`.
    TimeoutHit,

    // === Retry outcomes ===
    /// A retry was handed to the scheduler.
    ///
    /// Sets: `task`, `attempt` (the failed attempt), `delay_ms`,
    /// `reason` (last failure), `at`, `seq`.
    RetryScheduled,

    /// The retry budget is spent (or the backoff policy signalled stop);
    /// the task will not run again.
    ///
    /// Sets: `task`, `attempt`, `reason` (accumulated error message),
    /// `at`, `seq`.
    RetryExhausted,

    /// A non-retryable error aborted the sequence immediately.
    ///
    /// Sets: `task`, `attempt`, `reason`, `at`, `seq`.
    TaskAborted,

    // === Observer plumbing ===
    /// An observer dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (observer name), `reason`, `at`, `seq`.
    ObserverOverflow,

    /// An observer panicked while processing an event.
    ///
    /// Sets: `task` (observer name), `reason` (panic info), `at`, `seq`.
    ObserverPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task or observer, if applicable.
    pub task: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Backoff delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Attempt timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            attempt: None,
            reason: None,
            delay_ms: None,
            timeout_ms: None,
        }
    }

    /// Attaches a task (or observer) name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    /// Creates an observer overflow event.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::ObserverOverflow)
            .with_task(observer)
            .with_reason(reason)
    }

    /// Creates an observer panic event.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        Event::now(EventKind::ObserverPanicked)
            .with_task(observer)
            .with_reason(info)
    }

    /// Returns true for events that end a task's lifetime without success.
    ///
    /// Callers wanting final-failure visibility should watch for these.
    #[inline]
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::RetryExhausted | EventKind::TaskAborted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::now(EventKind::TaskStarting);
        let b = Event::now(EventKind::TaskCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_set_fields() {
        let ev = Event::now(EventKind::RetryScheduled)
            .with_task("sync")
            .with_attempt(2)
            .with_reason("boom")
            .with_delay(Duration::from_millis(250))
            .with_timeout(Duration::from_secs(5));

        assert_eq!(ev.kind, EventKind::RetryScheduled);
        assert_eq!(ev.task.as_deref(), Some("sync"));
        assert_eq!(ev.attempt, Some(2));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
        assert_eq!(ev.delay_ms, Some(250));
        assert_eq!(ev.timeout_ms, Some(5_000));
    }

    #[test]
    fn test_terminal_failure_classification() {
        assert!(Event::now(EventKind::RetryExhausted).is_terminal_failure());
        assert!(Event::now(EventKind::TaskAborted).is_terminal_failure());
        assert!(!Event::now(EventKind::TaskFailed).is_terminal_failure());
        assert!(!Event::now(EventKind::TaskCompleted).is_terminal_failure());
    }
}
