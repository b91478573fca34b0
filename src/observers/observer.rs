//! # Observer: user-facing event handlers.
//!
//! The [`Observe`] trait is the main **extension point** for end users.
//! All runtime [`Event`]s flow through the bus and into observers.
//!
//! Implementing your own observer allows you to plug in:
//! - metrics export;
//! - alerting on terminal failures (the recommended way to learn that a
//!   task spent its retry budget);
//! - structured logging.
//!
//! Each observer gets:
//! - a **dedicated worker task** (runs independently);
//! - a **per-observer bounded queue** (capacity via
//!   [`Observe::queue_capacity`]);
//! - **panic isolation** (panics are caught and reported as
//!   [`EventKind::ObserverPanicked`](crate::EventKind::ObserverPanicked)).
//!
//! ## Rules
//! - A slow observer only affects its own queue.
//! - Queue overflow drops the event **for this observer only** and publishes
//!   `EventKind::ObserverOverflow`; other observers are unaffected.
//! - Events are processed sequentially (FIFO) per observer.
//! - Observers do not block publishers or each other.

use async_trait::async_trait;

use crate::events::Event;

/// Event observer for runtime observability.
///
/// Each observer runs in isolation:
/// - **Bounded queue** buffers events (capacity via [`Self::queue_capacity`]).
/// - **Dedicated worker task** processes events sequentially (FIFO).
/// - **Panic isolation**: panics are caught and published as
///   `ObserverPanicked`.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Slow processing affects only this observer's queue.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use taskmill::{Event, Observe};
///
/// struct Alerts;
///
/// #[async_trait]
/// impl Observe for Alerts {
///     async fn on_event(&self, ev: &Event) {
///         if ev.is_terminal_failure() {
///             // page someone, export a metric, etc.
///         }
///     }
///
///     fn name(&self) -> &'static str { "alerts" }
/// }
/// ```
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    /// Events are delivered in FIFO order per observer.
    async fn on_event(&self, event: &Event);

    /// Returns the observer name used in overflow/panic events.
    ///
    /// Prefer short, descriptive names (e.g., "metrics", "audit").
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this observer.
    ///
    /// When the queue is full the new event is dropped for this observer
    /// only and an `ObserverOverflow` is published. The runtime clamps
    /// capacity to a minimum of 1. Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
