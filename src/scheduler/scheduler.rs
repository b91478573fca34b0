//! # Scheduler: releases entries onto an output channel when they fall due.
//!
//! The [`Scheduler`] owns an [`Agenda`] and, while running, drives a
//! dispatch loop on its own runtime task:
//!
//! ```text
//! loop {
//!   ├─► agenda empty      → wait for an insertion (or stop)
//!   ├─► front not yet due → sleep until due
//!   │        interruptible by: an earlier insertion, stop
//!   └─► front due         → pop and send to the output channel
//!            (send blocks when the channel is full: backpressure)
//! }
//! ```
//!
//! ## Rules
//! - `start` is idempotent; `stop` halts the loop without draining, so
//!   pending entries are abandoned (documented limitation, not a bug).
//!   The scheduler can be started again afterwards with its agenda intact.
//! - `submit`/`schedule`/`delay` are safe against each other and against
//!   the running loop; the agenda sits behind a mutex and insertions wake
//!   the loop through a [`Notify`].
//! - Past-due entries fire immediately and keep their relative order.
//! - Entries with equal due instants dispatch in insertion order.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;

use super::agenda::Agenda;
use super::scheduled::Scheduled;

/// Time-ordered dispatcher over a payload channel.
///
/// Generic over the payload so callers decide what flows through it; the
/// manager pushes its own task handlers, and a handler that re-submits
/// itself for a retry passes through unchanged. There is no way to wrap a
/// payload twice.
pub struct Scheduler<T> {
    agenda: Arc<Mutex<Agenda<T>>>,
    wakeup: Arc<Notify>,
    out: mpsc::Sender<T>,
    running: Mutex<Option<CancellationToken>>,
}

impl<T: Send + 'static> Scheduler<T> {
    /// Creates a stopped scheduler that will dispatch onto `out`.
    pub fn new(out: mpsc::Sender<T>) -> Self {
        Self {
            agenda: Arc::new(Mutex::new(Agenda::new())),
            wakeup: Arc::new(Notify::new()),
            out,
            running: Mutex::new(None),
        }
    }

    /// Starts the dispatch loop on its own runtime task.
    ///
    /// A no-op when already running. Must be called from within a tokio
    /// runtime.
    pub fn start(&self) {
        let mut running = self.running.lock().unwrap();
        if running.is_some() {
            return;
        }

        let token = CancellationToken::new();
        tokio::spawn(dispatch(
            Arc::clone(&self.agenda),
            Arc::clone(&self.wakeup),
            self.out.clone(),
            token.clone(),
        ));
        *running = Some(token);
    }

    /// Stops the dispatch loop. A no-op when already stopped.
    ///
    /// Entries still in the agenda are **not** drained; they stay queued
    /// and fire only if the scheduler is started again.
    pub fn stop(&self) {
        if let Some(token) = self.running.lock().unwrap().take() {
            token.cancel();
        }
    }

    /// Returns true while the dispatch loop is active.
    pub fn is_running(&self) -> bool {
        self.running.lock().unwrap().is_some()
    }

    /// Validates and inserts an entry, waking the dispatch loop.
    ///
    /// Insertion is accepted while stopped; the entry waits for the next
    /// `start`.
    pub fn submit(&self, entry: Scheduled<T>) -> Result<(), RuntimeError> {
        entry.validate()?;
        self.agenda.lock().unwrap().insert(entry);
        self.wakeup.notify_one();
        Ok(())
    }

    /// Schedules a payload for dispatch at the given instant.
    pub fn schedule(&self, at: Instant, task: T) -> Result<(), RuntimeError> {
        self.submit(Scheduled::at(at, task))
    }

    /// Schedules a payload for dispatch after the given delay.
    pub fn delay(&self, delay: Duration, task: T) -> Result<(), RuntimeError> {
        self.schedule(Instant::now() + delay, task)
    }

    /// Number of entries waiting in the agenda.
    pub fn pending(&self) -> usize {
        self.agenda.lock().unwrap().len()
    }
}

/// The dispatch loop. Exits on cancellation or when the output closes.
async fn dispatch<T>(
    agenda: Arc<Mutex<Agenda<T>>>,
    wakeup: Arc<Notify>,
    out: mpsc::Sender<T>,
    token: CancellationToken,
) {
    loop {
        // submit() keeps unset instants out, so a front entry always
        // carries a due instant.
        let front = { agenda.lock().unwrap().peek().map(Scheduled::due) };

        match front {
            None => {
                tokio::select! {
                    _ = wakeup.notified() => {}
                    _ = token.cancelled() => break,
                }
            }
            Some(due) => {
                let now = Instant::now();
                let due = due.unwrap_or(now);
                if due <= now {
                    let entry = { agenda.lock().unwrap().pop_front() };
                    if let Some(entry) = entry {
                        tokio::select! {
                            sent = out.send(entry.task) => {
                                if sent.is_err() {
                                    break;
                                }
                            }
                            _ = token.cancelled() => break,
                        }
                    }
                } else {
                    tokio::select! {
                        _ = time::sleep_until(due) => {}
                        _ = wakeup.notified() => {}
                        _ = token.cancelled() => break,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_dispatches_in_due_order() {
        let (tx, mut rx) = mpsc::channel(16);
        let scheduler = Scheduler::new(tx);

        scheduler.delay(Duration::from_millis(30), 3u32).unwrap();
        scheduler.delay(Duration::from_millis(10), 1u32).unwrap();
        scheduler.delay(Duration::from_millis(20), 2u32).unwrap();
        scheduler.start();

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_due_entries_fire_immediately_in_order() {
        let (tx, mut rx) = mpsc::channel(16);
        let scheduler = Scheduler::new(tx);

        let before = Instant::now();
        time::sleep(Duration::from_millis(50)).await;

        scheduler.schedule(before, 1u32).unwrap();
        scheduler.schedule(before, 2u32).unwrap();
        scheduler.schedule(before, 3u32).unwrap();
        scheduler.start();

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_insertion_interrupts_sleep() {
        let (tx, mut rx) = mpsc::channel(16);
        let scheduler = Scheduler::new(tx);
        scheduler.start();

        scheduler.delay(Duration::from_secs(10), 1u32).unwrap();
        scheduler.delay(Duration::from_millis(10), 2u32).unwrap();

        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(1));
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_abandons_pending_entries() {
        let (tx, mut rx) = mpsc::channel(16);
        let scheduler = Scheduler::new(tx);
        scheduler.start();

        scheduler.delay(Duration::from_secs(10), 1u32).unwrap();
        scheduler.stop();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.pending(), 1);

        let outcome = time::timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(outcome.is_err(), "no dispatch should happen after stop");
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let (tx, _rx) = mpsc::channel::<u32>(1);
        let scheduler = Scheduler::new(tx);

        assert!(!scheduler.is_running());
        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());

        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_dispatches_entries_submitted_while_stopped() {
        let (tx, mut rx) = mpsc::channel(16);
        let scheduler = Scheduler::new(tx);

        scheduler.delay(Duration::from_millis(5), 7u32).unwrap();
        scheduler.start();
        assert_eq!(rx.recv().await, Some(7));

        scheduler.stop();
        scheduler.delay(Duration::from_millis(5), 8u32).unwrap();
        scheduler.start();
        assert_eq!(rx.recv().await, Some(8));
        scheduler.stop();
    }

    #[tokio::test]
    async fn test_submit_rejects_unset_instant() {
        let (tx, _rx) = mpsc::channel::<u32>(1);
        let scheduler = Scheduler::new(tx);

        let outcome = scheduler.submit(Scheduled { at: None, task: 9 });
        assert!(matches!(outcome, Err(RuntimeError::Unschedulable)));
    }
}
