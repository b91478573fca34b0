//! # TaskHandler: one task's execution and retry state.
//!
//! A [`TaskHandler`] is created when work is submitted to the
//! [`TaskManager`](crate::TaskManager) and carries everything one task needs
//! across its attempts: the base context, the retry budget, the backoff
//! strategy, the per-attempt timeout, and the accumulated failure record.
//!
//! ## Attempt flow
//! ```text
//! exec()
//!   ├─► publish TaskStarting
//!   ├─► run_once()  (child token per attempt; optional timeout)
//!   │       ├─ Ok            ─► publish TaskCompleted, done
//!   │       └─ Err(Timeout)  ─► publish TimeoutHit, fall through
//!   └─► on failure:
//!        ├─► record cause into the RetryError
//!        ├─► Fatal           ─► publish TaskAborted, done
//!        ├─► budget spent    ─► publish RetryExhausted, done
//!        ├─► backoff stop    ─► publish RetryExhausted, done
//!        └─► otherwise       ─► publish RetryScheduled,
//!                                hand self to the scheduler with the delay
//! ```
//!
//! ## Rules
//! - `exec` consumes the handler; a retry moves it through the scheduler and
//!   back into the worker pool unchanged. Handlers are created only inside
//!   the manager from a bare [`TaskRef`], so a handler can never wrap
//!   another handler.
//! - The base context is shared across attempts; the timeout derives a child
//!   token per attempt and cancels only that child on expiry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time;

use tokio_util::sync::CancellationToken;

use crate::backoff::BackOff;
use crate::error::{RetryError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::scheduler::Scheduler;
use crate::tasks::options::TaskOptions;
use crate::tasks::task::TaskRef;

/// Execution and retry state for one submitted task.
pub(crate) struct TaskHandler {
    task: TaskRef,
    scheduler: Arc<Scheduler<TaskHandler>>,
    bus: Bus,
    ctx: CancellationToken,
    attempts: u32,
    retries: u32,
    backoff: BackOff,
    timeout: Option<Duration>,
    err: RetryError,
    queued_at: Instant,
}

impl TaskHandler {
    /// Wraps a bare task with its submission options.
    ///
    /// When retries are requested without an explicit backoff strategy, the
    /// default exponential backoff is materialized here.
    pub(crate) fn wrap(
        task: TaskRef,
        opts: TaskOptions,
        scheduler: Arc<Scheduler<TaskHandler>>,
        bus: Bus,
    ) -> Self {
        Self {
            task,
            scheduler,
            bus,
            ctx: opts.context.unwrap_or_default(),
            attempts: 0,
            retries: opts.retries,
            backoff: opts.backoff.unwrap_or_default(),
            timeout: opts.timeout,
            err: opts.error.map(RetryError::wrapping).unwrap_or_default(),
            queued_at: Instant::now(),
        }
    }

    /// Executes one attempt; on failure, re-submits itself for a retry.
    pub(crate) async fn exec(self) {
        let attempt = self.attempts + 1;
        self.bus.publish(
            Event::now(EventKind::TaskStarting)
                .with_task(self.task.name())
                .with_attempt(attempt),
        );

        match self.run_once(attempt).await {
            Ok(()) => {
                self.bus.publish(
                    Event::now(EventKind::TaskCompleted)
                        .with_task(self.task.name())
                        .with_attempt(attempt),
                );
            }
            Err(err) => self.handle_failure(attempt, err),
        }
    }

    /// Runs a single attempt against a child of the base context.
    ///
    /// A configured timeout wraps only this attempt; on expiry the child
    /// token is cancelled so the task can exit promptly, while the base
    /// context stays intact for later retries.
    async fn run_once(&self, attempt: u32) -> Result<(), TaskError> {
        let child = self.ctx.child_token();

        match self.timeout.filter(|d| *d > Duration::ZERO) {
            Some(dur) => match time::timeout(dur, self.task.execute(child.clone())).await {
                Ok(res) => res,
                Err(_elapsed) => {
                    child.cancel();
                    self.bus.publish(
                        Event::now(EventKind::TimeoutHit)
                            .with_task(self.task.name())
                            .with_attempt(attempt)
                            .with_timeout(dur),
                    );
                    Err(TaskError::Timeout { timeout: dur })
                }
            },
            None => self.task.execute(child).await,
        }
    }

    /// Records the failure and decides between abort, exhaustion, and retry.
    fn handle_failure(mut self, attempt: u32, err: TaskError) {
        self.attempts += 1;
        self.err.record(err.clone());
        self.err.since(self.queued_at);

        if !err.is_retryable() {
            self.bus.publish(
                Event::now(EventKind::TaskAborted)
                    .with_task(self.task.name())
                    .with_attempt(attempt)
                    .with_reason(err.to_string()),
            );
            return;
        }

        self.bus.publish(
            Event::now(EventKind::TaskFailed)
                .with_task(self.task.name())
                .with_attempt(attempt)
                .with_reason(err.to_string()),
        );

        if self.attempts > self.retries {
            self.publish_exhausted(attempt);
            return;
        }

        let Some(delay) = self.backoff.next() else {
            self.publish_exhausted(attempt);
            return;
        };

        self.bus.publish(
            Event::now(EventKind::RetryScheduled)
                .with_task(self.task.name())
                .with_attempt(attempt)
                .with_delay(delay)
                .with_reason(err.to_string()),
        );

        let scheduler = Arc::clone(&self.scheduler);
        // delay() always attaches a due instant, so submission cannot fail.
        let _ = scheduler.delay(delay, self);
    }

    fn publish_exhausted(&self, attempt: u32) {
        self.bus.publish(
            Event::now(EventKind::RetryExhausted)
                .with_task(self.task.name())
                .with_attempt(attempt)
                .with_reason(self.err.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::backoff::ExponentialBackOff;
    use crate::tasks::task::Task;

    use super::*;

    struct Flaky {
        succeed_on: u32,
        attempts: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Task for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn execute(&self, _ctx: CancellationToken) -> Result<(), TaskError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if n < self.succeed_on {
                return Err(TaskError::fail(format!("attempt {n} failed")));
            }
            Ok(())
        }
    }

    struct Harness {
        scheduler: Arc<Scheduler<TaskHandler>>,
        rx: mpsc::Receiver<TaskHandler>,
        bus: Bus,
    }

    fn harness() -> Harness {
        let (tx, rx) = mpsc::channel(16);
        let scheduler = Arc::new(Scheduler::new(tx));
        scheduler.start();
        Harness {
            scheduler,
            rx,
            bus: Bus::new(64),
        }
    }

    impl Harness {
        fn wrap(&self, task: TaskRef, opts: TaskOptions) -> TaskHandler {
            TaskHandler::wrap(task, opts, Arc::clone(&self.scheduler), self.bus.clone())
        }

        /// Executes handlers as they come back from the scheduler, like a
        /// single manager worker would.
        async fn drive(&mut self, rescheduled: usize) {
            for _ in 0..rescheduled {
                let handler = self.rx.recv().await.expect("a retry should be scheduled");
                handler.exec().await;
            }
        }
    }

    fn kind_counts(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<(EventKind, usize)> {
        let mut counts: Vec<(EventKind, usize)> = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            match counts.iter_mut().find(|(k, _)| *k == ev.kind) {
                Some((_, n)) => *n += 1,
                None => counts.push((ev.kind, 1)),
            }
        }
        counts
    }

    fn count(counts: &[(EventKind, usize)], kind: EventKind) -> usize {
        counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let mut h = harness();
        let mut events = h.bus.subscribe();
        let attempts = Arc::new(AtomicU32::new(0));
        let task = Arc::new(Flaky {
            succeed_on: 1,
            attempts: attempts.clone(),
        });

        h.wrap(task, TaskOptions::default().with_retries(3))
            .exec()
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(h.scheduler.pending(), 0);
        assert!(h.rx.try_recv().is_err(), "nothing should be rescheduled");

        let counts = kind_counts(&mut events);
        assert_eq!(count(&counts, EventKind::TaskStarting), 1);
        assert_eq!(count(&counts, EventKind::TaskCompleted), 1);
        assert_eq!(count(&counts, EventKind::TaskFailed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_rescheduled_until_success() {
        let mut h = harness();
        let mut events = h.bus.subscribe();
        let attempts = Arc::new(AtomicU32::new(0));
        let task = Arc::new(Flaky {
            succeed_on: 3,
            attempts: attempts.clone(),
        });

        let opts = TaskOptions::default()
            .with_retries(5)
            .with_backoff(BackOff::constant(Duration::from_millis(10)));
        h.wrap(task, opts).exec().await;
        h.drive(2).await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(h.rx.try_recv().is_err(), "success ends the sequence");

        let counts = kind_counts(&mut events);
        assert_eq!(count(&counts, EventKind::TaskStarting), 3);
        assert_eq!(count(&counts, EventKind::TaskFailed), 2);
        assert_eq!(count(&counts, EventKind::RetryScheduled), 2);
        assert_eq!(count(&counts, EventKind::TaskCompleted), 1);
        assert_eq!(count(&counts, EventKind::RetryExhausted), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhausted() {
        let mut h = harness();
        let mut events = h.bus.subscribe();
        let attempts = Arc::new(AtomicU32::new(0));
        let task = Arc::new(Flaky {
            succeed_on: u32::MAX,
            attempts: attempts.clone(),
        });

        let opts = TaskOptions::default()
            .with_retries(1)
            .with_backoff(BackOff::zero());
        h.wrap(task, opts).exec().await;
        h.drive(1).await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(h.rx.try_recv().is_err(), "budget is spent after 2 attempts");

        let counts = kind_counts(&mut events);
        assert_eq!(count(&counts, EventKind::TaskStarting), 2);
        assert_eq!(count(&counts, EventKind::RetryScheduled), 1);
        assert_eq!(count(&counts, EventKind::RetryExhausted), 1);
        assert_eq!(count(&counts, EventKind::TaskCompleted), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_short_circuits_retries() {
        let mut h = harness();
        let mut events = h.bus.subscribe();
        let task: TaskRef = crate::tasks::TaskFn::arc("doomed", |_ctx: CancellationToken| async {
            Err(TaskError::fatal("bad request"))
        });

        let opts = TaskOptions::default()
            .with_retries(5)
            .with_backoff(BackOff::zero());
        h.wrap(task, opts).exec().await;

        assert!(h.rx.try_recv().is_err(), "fatal errors are never retried");

        let counts = kind_counts(&mut events);
        assert_eq!(count(&counts, EventKind::TaskStarting), 1);
        assert_eq!(count(&counts, EventKind::TaskAborted), 1);
        assert_eq!(count(&counts, EventKind::TaskFailed), 0);
        assert_eq!(count(&counts, EventKind::RetryScheduled), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_stop_ends_the_sequence_early() {
        let mut h = harness();
        let mut events = h.bus.subscribe();
        let task: TaskRef = crate::tasks::TaskFn::arc("hopeless", |_ctx: CancellationToken| async {
            Err(TaskError::fail("down"))
        });

        // The budget allows 5 retries, but the policy stops first.
        let spent = ExponentialBackOff::new()
            .with_initial_interval(Duration::from_millis(10))
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(Duration::from_millis(1));
        let opts = TaskOptions::default()
            .with_retries(5)
            .with_backoff(BackOff::exponential(spent));
        h.wrap(task, opts).exec().await;

        assert!(h.rx.try_recv().is_err());
        let counts = kind_counts(&mut events);
        assert_eq!(count(&counts, EventKind::RetryExhausted), 1);
        assert_eq!(count(&counts, EventKind::RetryScheduled), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_the_attempt_and_cancels_its_child() {
        let mut h = harness();
        let mut events = h.bus.subscribe();
        let task: TaskRef = crate::tasks::TaskFn::arc("slow", |_ctx: CancellationToken| async {
            time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        });

        let opts = TaskOptions::default().with_timeout(Duration::from_millis(10));
        h.wrap(task, opts).exec().await;

        let counts = kind_counts(&mut events);
        assert_eq!(count(&counts, EventKind::TimeoutHit), 1);
        assert_eq!(count(&counts, EventKind::TaskFailed), 1);
        assert_eq!(count(&counts, EventKind::RetryExhausted), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_error_is_bundled_into_the_exhausted_reason() {
        let mut h = harness();
        let mut events = h.bus.subscribe();
        let task: TaskRef = crate::tasks::TaskFn::arc("sync", |_ctx: CancellationToken| async {
            Err(TaskError::fail("connection refused"))
        });

        let opts = TaskOptions::default().with_error_msg("could not sync inventory");
        h.wrap(task, opts).exec().await;

        let exhausted = std::iter::from_fn(|| events.try_recv().ok())
            .find(|ev| ev.kind == EventKind::RetryExhausted)
            .expect("the sequence should end exhausted");
        assert_eq!(
            exhausted.reason.as_deref(),
            Some("after 1 attempts: could not sync inventory")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_base_context_spends_the_budget() {
        let mut h = harness();
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let task: TaskRef = crate::tasks::TaskFn::arc("cancelled", move |ctx: CancellationToken| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if ctx.is_cancelled() {
                    return Err(TaskError::Canceled);
                }
                Ok(())
            }
        });

        let ctx = CancellationToken::new();
        ctx.cancel();
        let opts = TaskOptions::default()
            .with_retries(1)
            .with_backoff(BackOff::zero())
            .with_context(ctx);
        h.wrap(task, opts).exec().await;
        h.drive(1).await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(h.rx.try_recv().is_err());
    }
}
