//! # Exponential backoff with jitter and an elapsed-time budget.
//!
//! [`ExponentialBackOff`] increases the wait interval after each call. The
//! next interval is computed as:
//!
//! ```text
//! next = current_interval * rand(1 - randomization_factor, 1 + randomization_factor)
//! current_interval = min(current_interval * multiplier, max_interval)
//! ```
//!
//! Once the projected elapsed time (`elapsed + next`) would exceed
//! `max_elapsed_time`, [`ExponentialBackOff::next`] returns `None` and the
//! caller should give up.
//!
//! A randomization factor of `0` disables jitter, which makes the sequence
//! fully deterministic: `d, d*m, d*m^2, ...` capped at `max_interval`.

use std::time::{Duration, Instant};

use rand::Rng;

/// Default initial interval (500ms).
pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(500);
/// Default randomization factor (0.5).
pub const DEFAULT_RANDOMIZATION_FACTOR: f64 = 0.5;
/// Default interval multiplier (1.5).
pub const DEFAULT_MULTIPLIER: f64 = 1.5;
/// Default interval cap (60s).
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(60);
/// Default elapsed-time budget (15 minutes).
pub const DEFAULT_MAX_ELAPSED_TIME: Duration = Duration::from_secs(15 * 60);

/// Stateful exponential backoff generator.
///
/// Construct with [`ExponentialBackOff::new`] and adjust with the `with_*`
/// builders; the generator starts from `initial_interval` and grows by
/// `multiplier` per call, capped at `max_interval`.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use taskmill::ExponentialBackOff;
///
/// let mut backoff = ExponentialBackOff::new()
///     .with_initial_interval(Duration::from_millis(100))
///     .with_multiplier(2.0)
///     .with_randomization_factor(0.0);
///
/// assert_eq!(backoff.next(), Some(Duration::from_millis(100)));
/// assert_eq!(backoff.next(), Some(Duration::from_millis(200)));
/// assert_eq!(backoff.next(), Some(Duration::from_millis(400)));
/// ```
#[derive(Clone, Debug)]
pub struct ExponentialBackOff {
    initial_interval: Duration,
    randomization_factor: f64,
    multiplier: f64,
    max_interval: Duration,
    max_elapsed_time: Duration,
    current_interval: Duration,
    start_time: Instant,
}

impl Default for ExponentialBackOff {
    fn default() -> Self {
        Self::new()
    }
}

impl ExponentialBackOff {
    /// Creates a generator with the default parameters:
    /// initial 500ms, randomization 0.5, multiplier 1.5, max interval 60s,
    /// max elapsed time 15 minutes.
    pub fn new() -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            randomization_factor: DEFAULT_RANDOMIZATION_FACTOR,
            multiplier: DEFAULT_MULTIPLIER,
            max_interval: DEFAULT_MAX_INTERVAL,
            max_elapsed_time: DEFAULT_MAX_ELAPSED_TIME,
            current_interval: DEFAULT_INITIAL_INTERVAL,
            start_time: Instant::now(),
        }
    }

    /// Sets the first interval returned by [`Self::next`].
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self.current_interval = interval;
        self
    }

    /// Sets the jitter range as a fraction of the current interval.
    ///
    /// `0.0` disables jitter; `0.5` returns values within ±50% of the
    /// current interval.
    pub fn with_randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor;
        self
    }

    /// Sets the multiplier applied to the current interval after each call.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the cap that the current interval never exceeds.
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Sets the elapsed-time budget; `Duration::ZERO` disables the budget.
    pub fn with_max_elapsed_time(mut self, elapsed: Duration) -> Self {
        self.max_elapsed_time = elapsed;
        self
    }

    /// Returns the next wait interval, or `None` once the projected elapsed
    /// time would exceed `max_elapsed_time`.
    ///
    /// The interval state advances on every call, including the one that
    /// returns `None`.
    pub fn next(&mut self) -> Option<Duration> {
        let elapsed = self.elapsed_time();
        let next = self.next_interval();

        // Grow the current interval for the following call, capped at max.
        self.current_interval = Self::scale(self.current_interval, self.multiplier, self.max_interval);

        if !self.max_elapsed_time.is_zero() && elapsed + next > self.max_elapsed_time {
            return None;
        }

        Some(next)
    }

    /// Restores the initial interval and restarts the elapsed-time clock.
    pub fn reset(&mut self) {
        self.current_interval = self.initial_interval;
        self.start_time = Instant::now();
    }

    /// Time since creation or the last [`Self::reset`].
    pub fn elapsed_time(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Multiplies `interval` by `factor`, clamping to `max` and guarding
    /// against non-finite intermediate values.
    fn scale(interval: Duration, factor: f64, max: Duration) -> Duration {
        let secs = interval.as_secs_f64() * factor;
        if !secs.is_finite() || secs < 0.0 || secs > max.as_secs_f64() {
            max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Jitters the current interval within the randomization range.
    fn next_interval(&self) -> Duration {
        if self.randomization_factor <= 0.0 {
            return self.current_interval;
        }

        let current = self.current_interval.as_secs_f64();
        let delta = self.randomization_factor * current;
        let low = (current - delta).max(0.0);
        let high = current + delta;
        if low >= high {
            return self.current_interval;
        }

        Duration::from_secs_f64(rand::rng().random_range(low..=high))
    }
}
