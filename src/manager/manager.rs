//! # TaskManager: bounded worker pool with delayed scheduling and retries.
//!
//! The [`TaskManager`] owns the intake channel, a [`Scheduler`] for
//! delayed/retried work, the event [`Bus`], and a fixed pool of worker
//! tasks.
//!
//! ## Data flow
//! ```text
//! queue(task, opts) ─► wrap ─► [intake] ─► dispatcher ─► [ready] ─► worker × N
//! delay / schedule  ─► wrap ─► Scheduler ────┘                          │
//!                                  ▲                                    ▼
//!                                  └──── retry (backoff delay) ◄── exec() fails
//! ```
//!
//! Both queues are bounded by `queue_size`; a full intake queue blocks the
//! caller of `queue()`, which is the intended backpressure mechanism.
//!
//! ## Lifecycle
//! - `start()` is idempotent: starts the scheduler, the observer listener,
//!   one dispatcher, and `workers` worker tasks.
//! - `stop()` is idempotent: stops the scheduler (pending delayed work is
//!   abandoned), signals the dispatcher, and waits until every handler
//!   accepted before the stop has finished executing. The manager can be
//!   started again afterwards.
//!
//! ## Ordering
//! Directly queued tasks reach workers in submission order; completion
//! order across workers is unspecified. Delayed tasks become ready in due
//! order.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex as AsyncMutex, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::observers::{Observe, ObserverSet};
use crate::scheduler::Scheduler;
use crate::tasks::{TaskHandler, TaskOptions, TaskRef};

use super::config::Config;

/// Handles spawned while the manager runs; taken out and awaited on stop.
struct Runtime {
    token: CancellationToken,
    pool: JoinSet<()>,
    listener_token: CancellationToken,
    listener: JoinHandle<()>,
}

/// Executes tasks on a fixed worker pool, with bounded intake, delayed
/// scheduling, and backoff-driven retries.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use taskmill::{Config, TaskFn, TaskManager, TaskOptions, TaskRef};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = TaskManager::new(Config::default())?;
///     manager.start().await;
///
///     let done = Arc::new(AtomicU32::new(0));
///     let counter = done.clone();
///     let task: TaskRef = TaskFn::arc("hello", move |_ctx: CancellationToken| {
///         let counter = counter.clone();
///         async move {
///             counter.fetch_add(1, Ordering::SeqCst);
///             Ok(())
///         }
///     });
///
///     manager.queue(task, TaskOptions::default()).await?;
///     manager.stop().await;
///     assert_eq!(done.load(Ordering::SeqCst), 1);
///     Ok(())
/// }
/// ```
pub struct TaskManager {
    cfg: Config,
    bus: Bus,
    observers: Vec<Arc<dyn Observe>>,
    scheduler: Arc<Scheduler<TaskHandler>>,
    intake: mpsc::Sender<TaskHandler>,
    intake_rx: Arc<Mutex<Option<mpsc::Receiver<TaskHandler>>>>,
    state: RwLock<Option<Runtime>>,
}

impl TaskManager {
    /// Creates a stopped manager.
    ///
    /// Fails with [`RuntimeError::NoWorkers`] when `cfg.workers` is zero.
    /// A negative queue size is unrepresentable in the configuration type,
    /// so no second validation exists.
    pub fn new(cfg: Config) -> Result<Self, RuntimeError> {
        if cfg.workers == 0 {
            return Err(RuntimeError::NoWorkers);
        }

        let (intake, intake_rx) = mpsc::channel(cfg.channel_capacity());
        Ok(Self {
            bus: Bus::new(cfg.bus_capacity),
            observers: Vec::new(),
            scheduler: Arc::new(Scheduler::new(intake.clone())),
            intake,
            intake_rx: Arc::new(Mutex::new(Some(intake_rx))),
            cfg,
            state: RwLock::new(None),
        })
    }

    /// Registers event observers; each gets its own queue and worker when
    /// the manager starts.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Starts the scheduler, the observer listener, the dispatcher, and the
    /// worker pool. A no-op when already running.
    pub async fn start(&self) {
        let mut state = self.state.write().await;

        // Restarts pick the scheduler's agenda back up.
        self.scheduler.start();

        if state.is_some() {
            return;
        }
        let Some(intake_rx) = self.intake_rx.lock().unwrap().take() else {
            return;
        };

        let token = CancellationToken::new();
        let (ready_tx, ready_rx) = mpsc::channel(self.cfg.channel_capacity());
        let ready_rx = Arc::new(AsyncMutex::new(ready_rx));

        let mut pool = JoinSet::new();
        for _ in 0..self.cfg.workers {
            pool.spawn(worker(Arc::clone(&ready_rx)));
        }
        pool.spawn(dispatch(
            intake_rx,
            ready_tx,
            token.clone(),
            Arc::clone(&self.intake_rx),
        ));

        let listener_token = CancellationToken::new();
        let set = ObserverSet::new(self.observers.clone(), self.bus.clone());
        let listener = tokio::spawn(observer_listener(
            self.bus.subscribe(),
            set,
            listener_token.clone(),
        ));

        *state = Some(Runtime {
            token,
            pool,
            listener_token,
            listener,
        });
        self.bus.publish(Event::now(EventKind::ManagerStarted));
    }

    /// Stops the manager. A no-op when already stopped.
    ///
    /// Work accepted by `queue()` before the stop finishes executing before
    /// this returns. Entries still waiting in the scheduler are abandoned;
    /// they fire only if the manager is started again.
    pub async fn stop(&self) {
        let mut state = self.state.write().await;
        let Some(mut runtime) = state.take() else {
            return;
        };

        self.scheduler.stop();
        runtime.token.cancel();
        while runtime.pool.join_next().await.is_some() {}

        self.bus.publish(Event::now(EventKind::ManagerStopped));
        runtime.listener_token.cancel();
        let _ = runtime.listener.await;
    }

    /// Returns true while the manager is running.
    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Submits a task for execution as soon as a worker is available.
    ///
    /// Blocks while the intake queue is full (backpressure). Fails with
    /// [`RuntimeError::Stopped`] when the manager is not running; the check
    /// and the enqueue hold the same lock, so a concurrent [`Self::stop`]
    /// cannot slip between them.
    pub async fn queue(&self, task: TaskRef, opts: TaskOptions) -> Result<(), RuntimeError> {
        let handler = self.wrap(task, opts);

        let state = self.state.read().await;
        if state.is_none() {
            return Err(RuntimeError::Stopped);
        }
        self.intake
            .send(handler)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    /// Submits a task for execution after the given delay.
    ///
    /// The entry is accepted even while the manager is stopped and fires
    /// once it is started.
    pub fn delay(
        &self,
        delay: Duration,
        task: TaskRef,
        opts: TaskOptions,
    ) -> Result<(), RuntimeError> {
        self.scheduler.delay(delay, self.wrap(task, opts))
    }

    /// Submits a task for execution at the given instant.
    pub fn schedule(
        &self,
        at: Instant,
        task: TaskRef,
        opts: TaskOptions,
    ) -> Result<(), RuntimeError> {
        self.scheduler.schedule(at, self.wrap(task, opts))
    }

    /// Returns a receiver observing all runtime events from this point on.
    ///
    /// Watching for [`Event::is_terminal_failure`] is how callers learn
    /// that a task spent its retry budget or aborted on a fatal error.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    fn wrap(&self, task: TaskRef, opts: TaskOptions) -> TaskHandler {
        TaskHandler::wrap(task, opts, Arc::clone(&self.scheduler), self.bus.clone())
    }
}

/// Forwards intake work to the ready queue until stopped; the stop path
/// drains what was already accepted, then closes the ready queue and puts
/// the intake receiver back for the next start.
async fn dispatch(
    mut intake: mpsc::Receiver<TaskHandler>,
    ready: mpsc::Sender<TaskHandler>,
    token: CancellationToken,
    slot: Arc<Mutex<Option<mpsc::Receiver<TaskHandler>>>>,
) {
    loop {
        tokio::select! {
            received = intake.recv() => match received {
                Some(handler) => {
                    if ready.send(handler).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            _ = token.cancelled() => break,
        }
    }

    while let Ok(handler) = intake.try_recv() {
        if ready.send(handler).await.is_err() {
            break;
        }
    }

    *slot.lock().unwrap() = Some(intake);
}

/// Executes ready handlers until the queue closes.
async fn worker(ready: Arc<AsyncMutex<mpsc::Receiver<TaskHandler>>>) {
    loop {
        let handler = { ready.lock().await.recv().await };
        match handler {
            Some(handler) => handler.exec().await,
            None => break,
        }
    }
}

/// Fans bus events out to the observer set, then delivers anything still
/// buffered and shuts the set down.
async fn observer_listener(
    mut rx: broadcast::Receiver<Event>,
    set: ObserverSet,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(ev) => set.emit(&ev),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = token.cancelled() => break,
        }
    }

    loop {
        match rx.try_recv() {
            Ok(ev) => set.emit(&ev),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    set.shutdown().await;
}
