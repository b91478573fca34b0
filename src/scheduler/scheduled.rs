//! # A payload paired with the instant it becomes due.
//!
//! [`Scheduled`] entries are created when a caller requests delayed or
//! absolute-time execution and are destroyed once the dispatch loop hands
//! the payload to the output channel.

use tokio::time::Instant;

use crate::error::RuntimeError;

/// An immutable pairing of a due instant and a payload awaiting dispatch.
///
/// The due instant is optional so that an unset entry can be represented
/// and rejected: [`Scheduled::validate`] fails with
/// [`RuntimeError::Unschedulable`] when `at` is `None`. Entries built via
/// [`Scheduled::at`] always validate.
#[derive(Debug)]
pub struct Scheduled<T> {
    /// The instant at which the payload becomes eligible for dispatch.
    pub at: Option<Instant>,
    /// The payload to dispatch.
    pub task: T,
}

impl<T> Scheduled<T> {
    /// Creates an entry due at the given instant.
    pub fn at(at: Instant, task: T) -> Self {
        Self { at: Some(at), task }
    }

    /// Rejects entries that carry no due instant.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.at.is_none() {
            return Err(RuntimeError::Unschedulable);
        }
        Ok(())
    }

    /// The due instant, if set.
    pub fn due(&self) -> Option<Instant> {
        self.at
    }
}
