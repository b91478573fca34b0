//! # Demo: queue_counter
//!
//! Queues one hundred small tasks onto a four-worker pool and shows that
//! `stop()` waits for everything accepted before it returns.
//!
//! ## Run
//! ```bash
//! cargo run --example queue_counter
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use taskmill::{Config, TaskFn, TaskManager, TaskOptions, TaskRef};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Four workers, synchronous hand-off (queue_size = 0)
    let cfg = Config {
        workers: 4,
        queue_size: 0,
        ..Config::default()
    };
    let manager = TaskManager::new(cfg)?;
    manager.start().await;

    // 2. Queue 100 tasks that each bump a shared counter
    let counter = Arc::new(AtomicU32::new(0));
    for _ in 0..100 {
        let counter = counter.clone();
        let task: TaskRef = TaskFn::arc("bump", move |_ctx: CancellationToken| {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        manager.queue(task, TaskOptions::default()).await?;
    }

    // 3. Stop drains everything already accepted
    manager.stop().await;
    println!("[main] executed {} tasks", counter.load(Ordering::SeqCst));
    Ok(())
}
