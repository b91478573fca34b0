//! # Demo: retry_with_backoff
//!
//! A task fails twice before succeeding; the manager retries it with a
//! constant backoff while the built-in `LogWriter` observer prints every
//! lifecycle event.
//!
//! ## Run
//! ```bash
//! cargo run --example retry_with_backoff --features logging
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use taskmill::{BackOff, Config, LogWriter, TaskFn, TaskManager, TaskOptions, TaskRef};
use tokio_util::sync::CancellationToken;

static ATTEMPTS: AtomicU32 = AtomicU32::new(0);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Default pool, events printed by the LogWriter observer
    let manager = TaskManager::new(Config::default())?.with_observers(vec![Arc::new(LogWriter)]);
    manager.start().await;
    let mut events = manager.subscribe();

    // 2. A task that fails twice before succeeding
    let flaky: TaskRef = TaskFn::arc("flaky", |_ctx: CancellationToken| async move {
        let attempt = ATTEMPTS.fetch_add(1, Ordering::Relaxed) + 1;
        if attempt <= 2 {
            return Err(taskmill::TaskError::fail(format!("boom #{attempt}")));
        }
        Ok(())
    });

    // 3. Five retries, 100ms apart
    let opts = TaskOptions::default()
        .with_retries(5)
        .with_backoff(BackOff::constant(Duration::from_millis(100)));
    manager.queue(flaky, opts).await?;

    // 4. Wait for the completion event, then shut down
    while let Ok(ev) = events.recv().await {
        if ev.kind == taskmill::EventKind::TaskCompleted {
            break;
        }
    }
    manager.stop().await;

    println!("[main] succeeded after {} attempts", ATTEMPTS.load(Ordering::Relaxed));
    Ok(())
}
