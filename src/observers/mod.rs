//! Observer plumbing: the user extension point for runtime events.
//!
//! ## Contents
//! - [`Observe`] async trait implemented by user observers
//! - [`ObserverSet`] non-blocking fan-out with per-observer queues
//! - [`LogWriter`] built-in stdout observer (feature `logging`)
//!
//! Observers are the crate's answer to "how do I find out that a task
//! exhausted its retries?": watch for
//! [`Event::is_terminal_failure`](crate::Event::is_terminal_failure).

mod observer;
mod set;

pub use observer::Observe;
pub use set::ObserverSet;

#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
