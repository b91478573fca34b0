//! # Backoff policy for spacing retry attempts.
//!
//! [`BackOff`] is a closed set of strategies that generate the wait duration
//! before the next retry. `next()` returns `None` (the stop sentinel) when
//! no further retries should be attempted; `reset()` restores the initial
//! state so one policy value can be reused across independent retry
//! sequences.
//!
//! - [`BackOff::Zero`] — retry immediately, forever.
//! - [`BackOff::Constant`] — the same fixed delay on every call.
//! - [`BackOff::Exponential`] — growing delays with jitter and an
//!   elapsed-time budget (see [`ExponentialBackOff`]).

use std::time::Duration;

use crate::backoff::ExponentialBackOff;

/// Retry delay strategy.
///
/// The variant set is closed so callers can match exhaustively; the stop
/// sentinel is `None` from [`BackOff::next`], distinct from any real
/// duration (including zero).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use taskmill::BackOff;
///
/// let mut constant = BackOff::constant(Duration::from_millis(250));
/// assert_eq!(constant.next(), Some(Duration::from_millis(250)));
/// assert_eq!(constant.next(), Some(Duration::from_millis(250)));
///
/// let mut zero = BackOff::zero();
/// assert_eq!(zero.next(), Some(Duration::ZERO));
/// ```
#[derive(Clone, Debug)]
pub enum BackOff {
    /// Immediate retry without any delay, unbounded.
    Zero,
    /// The same wait interval on every call.
    Constant(Duration),
    /// Exponentially growing intervals with jitter and a time budget.
    Exponential(ExponentialBackOff),
}

impl Default for BackOff {
    /// The default strategy is the default exponential backoff, matching
    /// what the manager materializes when retries are requested without an
    /// explicit policy.
    fn default() -> Self {
        BackOff::Exponential(ExponentialBackOff::new())
    }
}

impl BackOff {
    /// Creates the immediate-retry strategy.
    pub fn zero() -> Self {
        BackOff::Zero
    }

    /// Creates a fixed-interval strategy.
    pub fn constant(interval: Duration) -> Self {
        BackOff::Constant(interval)
    }

    /// Creates an exponential strategy from a configured generator.
    pub fn exponential(backoff: ExponentialBackOff) -> Self {
        BackOff::Exponential(backoff)
    }

    /// Returns the duration to wait before the next attempt, or `None` to
    /// signal that no further retries should be made.
    pub fn next(&mut self) -> Option<Duration> {
        match self {
            BackOff::Zero => Some(Duration::ZERO),
            BackOff::Constant(interval) => Some(*interval),
            BackOff::Exponential(backoff) => backoff.next(),
        }
    }

    /// Restores the initial state for reuse across independent retry
    /// sequences. A no-op for the stateless variants.
    pub fn reset(&mut self) {
        if let BackOff::Exponential(backoff) = self {
            backoff.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_always_returns_zero() {
        let mut backoff = BackOff::zero();
        for _ in 0..50 {
            assert_eq!(backoff.next(), Some(Duration::ZERO));
        }
    }

    #[test]
    fn test_constant_always_returns_interval() {
        let interval = Duration::from_millis(125);
        let mut backoff = BackOff::constant(interval);
        for _ in 0..50 {
            assert_eq!(backoff.next(), Some(interval));
        }
    }

    #[test]
    fn test_stop_sentinel_is_distinct_from_zero_duration() {
        let mut zero = BackOff::zero();
        assert_ne!(zero.next(), None);

        let mut spent = BackOff::exponential(
            ExponentialBackOff::new()
                .with_initial_interval(Duration::from_millis(10))
                .with_randomization_factor(0.0)
                .with_max_elapsed_time(Duration::from_millis(1)),
        );
        assert_eq!(spent.next(), None);
    }

    #[test]
    fn test_reset_is_noop_for_stateless_variants() {
        let mut zero = BackOff::zero();
        zero.reset();
        assert_eq!(zero.next(), Some(Duration::ZERO));

        let mut constant = BackOff::constant(Duration::from_secs(1));
        constant.reset();
        assert_eq!(constant.next(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_default_is_exponential() {
        assert!(matches!(BackOff::default(), BackOff::Exponential(_)));
    }
}
