//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable). The common
//! handle type is [`TaskRef`], an `Arc<dyn Task>` suitable for sharing
//! across the runtime.
//!
//! A task receives a [`CancellationToken`] and should periodically check it
//! to stop cooperatively when its context is cancelled.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit of work.
///
/// A `Task` has an async [`execute`](Task::execute) method that receives a
/// [`CancellationToken`]. Implementors should regularly check cancellation
/// and exit promptly; a cancelled context charged against the retry budget
/// fails every remaining attempt.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use taskmill::{Task, TaskError};
///
/// struct Demo;
///
/// #[async_trait]
/// impl Task for Demo {
///     fn name(&self) -> &str { "demo" }
///
///     async fn execute(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name used in events.
    fn name(&self) -> &str {
        "async task"
    }

    /// Executes one attempt of the task.
    ///
    /// Implementations should check `ctx.is_cancelled()` and exit quickly
    /// to honor cancellation and per-attempt timeouts.
    async fn execute(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}
