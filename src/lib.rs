//! # taskmill
//!
//! **Taskmill** is a bounded worker pool for Rust with delayed scheduling
//! and backoff-driven retries.
//!
//! It executes user-supplied tasks on a fixed number of workers, defers
//! work to a future instant through a time-ordered scheduler, and retries
//! failures with configurable backoff strategies. The crate is designed as
//! a building block for services that need routine, non-critical work to
//! happen off the request path.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  caller ──► TaskManager::queue(task, opts) ────────────────┐
//!  caller ──► TaskManager::delay / schedule ──► Scheduler    │
//!                                                  │         ▼
//!                                                  │   [intake queue]   (bounded: backpressure)
//!                                                  │         │
//!                                  (due entries)   └────────►│
//!                                                            ▼
//!                                                       dispatcher
//!                                                            │
//!                                                     [ready queue]
//!                                                   ┌────────┼────────┐
//!                                                   ▼        ▼        ▼
//!                                                worker1  worker2  workerN
//!                                                   │        │        │
//!                                              TaskHandler::exec() per handler
//!                                                   │
//!                                        on failure: backoff delay ──► Scheduler
//!
//!  every stage ── publish(Event) ──► Bus ──► observer listener ──► ObserverSet
//!                                                            ┌────────┼────────┐
//!                                                            ▼        ▼        ▼
//!                                                        obs1.on  obs2.on  obsN.on
//!                                                        _event()  _event()  _event()
//! ```
//!
//! ### Retry lifecycle
//! ```text
//! queue(task, {retries, backoff, timeout, context})
//!
//! exec attempt:
//!   ├─► publish TaskStarting
//!   ├─► run under child token (+ per-attempt timeout)
//!   │       ├─ Ok            ─► TaskCompleted, done
//!   │       ├─ Err(Fatal)    ─► TaskAborted, done (never retried)
//!   │       └─ Err(other)    ─► TaskFailed
//!   ├─► budget spent          ─► RetryExhausted, done
//!   ├─► backoff says stop     ─► RetryExhausted, done
//!   └─► else                  ─► RetryScheduled, Scheduler::delay(backoff.next())
//!                                  └─► back through intake to a worker
//! ```
//!
//! ## Features
//! | Area            | Description                                                         | Key types / traits                  |
//! |-----------------|---------------------------------------------------------------------|-------------------------------------|
//! | **Tasks**       | Define tasks as trait impls or plain closures.                      | [`Task`], [`TaskFn`], [`TaskRef`]   |
//! | **Retries**     | Budgeted retries spaced by a closed set of backoff strategies.      | [`TaskOptions`], [`BackOff`]        |
//! | **Scheduling**  | Run work after a delay or at an absolute instant.                   | [`Scheduler`], [`Scheduled`], [`Agenda`] |
//! | **Worker pool** | Fixed workers, bounded queues, cooperative backpressure.            | [`TaskManager`], [`Config`]         |
//! | **Observability** | Watch lifecycle events, including terminal failures.              | [`Observe`], [`Event`], [`EventKind`] |
//! | **Errors**      | Typed runtime/task errors and the accumulated retry record.         | [`RuntimeError`], [`TaskError`], [`RetryError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Delivery caveats
//! - Delayed tasks fire *no earlier than* their due instant, not exactly at
//!   it.
//! - `stop()` abandons entries still waiting in the scheduler; they are not
//!   drained or persisted.
//! - Task failures never propagate back to the caller of `queue()`;
//!   subscribe to the bus or register an [`Observe`] implementation and
//!   watch for [`Event::is_terminal_failure`].
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskmill::{BackOff, Config, TaskFn, TaskManager, TaskOptions, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TaskManager::new(Config::default())?;
//!     manager.start().await;
//!
//!     // A task that runs once and exits.
//!     let hello: TaskRef = TaskFn::arc("hello", |ctx: CancellationToken| async move {
//!         if ctx.is_cancelled() {
//!             return Ok(());
//!         }
//!         println!("Hello from a worker!");
//!         Ok(())
//!     });
//!
//!     // Three retries, a fixed delay between attempts, 5s per attempt.
//!     let opts = TaskOptions::default()
//!         .with_retries(3)
//!         .with_backoff(BackOff::constant(Duration::from_millis(100)))
//!         .with_timeout(Duration::from_secs(5));
//!
//!     manager.queue(hello, opts).await?;
//!     manager.stop().await;
//!     Ok(())
//! }
//! ```

mod backoff;
mod error;
mod events;
mod manager;
mod observers;
mod scheduler;
mod tasks;

// ---- Public re-exports ----

pub use backoff::{BackOff, ExponentialBackOff};
pub use error::{RetryError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use manager::{Config, TaskManager};
pub use observers::{Observe, ObserverSet};
pub use scheduler::{Agenda, Scheduled, Scheduler};
pub use tasks::{Task, TaskFn, TaskOptions, TaskRef};

// Optional: expose a simple built-in logging observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
