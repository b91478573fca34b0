//! # Simple logging observer for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [starting] task=sync attempt=1
//! [failed] task=sync err="connection refused" attempt=1
//! [retry] task=sync delay=750ms after_attempt=1 err="connection refused"
//! [timeout] task=sync timeout=5000ms
//! [completed] task=sync attempt=2
//! [exhausted] task=sync err="after 3 attempts: connection refused"
//! [manager-started]
//! [manager-stopped]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::observers::Observe;

/// Simple stdout logging observer.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use; implement a custom [`Observe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TaskStarting => {
                if let (Some(task), Some(att)) = (&e.task, e.attempt) {
                    println!("[starting] task={task} attempt={att}");
                }
            }
            EventKind::TaskCompleted => {
                println!("[completed] task={:?} attempt={:?}", e.task, e.attempt);
            }
            EventKind::TaskFailed => {
                println!(
                    "[failed] task={:?} err={:?} attempt={:?}",
                    e.task, e.reason, e.attempt
                );
            }
            EventKind::TimeoutHit => {
                println!("[timeout] task={:?} timeout_ms={:?}", e.task, e.timeout_ms);
            }
            EventKind::RetryScheduled => {
                println!(
                    "[retry] task={:?} delay_ms={:?} after_attempt={:?} err={:?}",
                    e.task, e.delay_ms, e.attempt, e.reason
                );
            }
            EventKind::RetryExhausted => {
                println!("[exhausted] task={:?} err={:?}", e.task, e.reason);
            }
            EventKind::TaskAborted => {
                println!("[aborted] task={:?} err={:?}", e.task, e.reason);
            }
            EventKind::ManagerStarted => {
                println!("[manager-started]");
            }
            EventKind::ManagerStopped => {
                println!("[manager-stopped]");
            }
            EventKind::ObserverOverflow | EventKind::ObserverPanicked => {
                println!("[observer] task={:?} reason={:?}", e.task, e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
