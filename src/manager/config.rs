//! # Manager configuration.
//!
//! Provides [`Config`] the settings for the worker pool and its queues.
//!
//! ## Sentinel values
//! - `queue_size = 0` → the smallest channel capacity, making every enqueue
//!   a synchronous hand-off to the dispatcher
//! - `bus_capacity` is clamped to a minimum of 1 by the bus

/// Configuration for a [`TaskManager`](crate::TaskManager).
///
/// ## Field semantics
/// - `workers`: number of concurrent worker tasks (must be at least 1;
///   validated at construction)
/// - `queue_size`: intake and ready queue capacity; when full, `queue()`
///   blocks the caller (backpressure)
/// - `bus_capacity`: event bus ring buffer size
///
/// Queue sizes cannot be negative here; `usize` makes that configuration
/// error unrepresentable rather than checked.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of worker tasks pulling from the ready queue.
    pub workers: usize,

    /// Capacity of the bounded intake and ready queues.
    ///
    /// `0` keeps the queues at the minimum capacity of one slot, so a
    /// producer hands work to the dispatcher nearly synchronously.
    pub queue_size: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind by more than this many events get
    /// `Lagged` and skip the oldest items.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the channel capacity for the intake and ready queues.
    ///
    /// Bounded channels need at least one slot, so `queue_size = 0` maps
    /// to 1.
    #[inline]
    pub fn channel_capacity(&self) -> usize {
        self.queue_size.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `workers = 4`
    /// - `queue_size = 64`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            workers: 4,
            queue_size: 64,
            bus_capacity: 1024,
        }
    }
}
