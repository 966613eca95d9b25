//! Retry policy machinery
//!
//! This module decides *whether* and *when* a failed attempt should run
//! again; it never sleeps or performs I/O itself. The transport owns the
//! attempt loop, asks the [`RetryPolicy`] after each failure and the
//! [`BackoffStrategy`] for the pause before the next try.

use std::time::Duration;

use thiserror::Error;

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Errors produced while configuring retry behavior
#[derive(Debug, Error)]
pub enum RetryError {
    /// The retry configuration is invalid
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration {
        /// What was wrong with the configuration.
        message: String,
    },
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation after the backoff-computed delay
    Retry,
    /// Retry the operation after a custom delay
    RetryAfter(Duration),
    /// Don't retry the operation
    Stop,
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E>: Send + Sync {
    /// Determine if the error should be retried and optionally provide a
    /// custom delay. `attempt` is zero-based: the first failure arrives with
    /// `attempt == 0`.
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Linear backoff: initial_delay + (attempt * increment)
    Linear {
        /// Delay before the first retry.
        initial_delay: Duration,
        /// Added on top for every further retry.
        increment: Duration,
    },
    /// Exponential backoff: initial_delay * base^attempt, capped
    Exponential {
        /// Delay before the first retry.
        initial_delay: Duration,
        /// Multiplier applied per attempt.
        base: f64,
        /// Upper bound on the computed delay.
        max_delay: Duration,
    },
}

impl BackoffStrategy {
    /// Calculate the delay before the retry following the given zero-based
    /// attempt.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Linear { initial_delay, increment } => {
                initial_delay.saturating_add(increment.saturating_mul(attempt))
            }
            Self::Exponential { initial_delay, base, max_delay } => {
                let scaled = initial_delay.as_millis() as f64 * base.powi(attempt as i32);
                let capped = scaled.min(max_delay.as_millis() as f64);
                Duration::from_millis(capped as u64)
            }
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Number of retries after the first attempt.
    pub retry_count: u32,
    /// Backoff strategy for calculating delays between attempts.
    pub backoff: BackoffStrategy,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_RETRY_COUNT,
            backoff: BackoffStrategy::Fixed(DEFAULT_RETRY_DELAY),
        }
    }
}

impl RetryOptions {
    /// Options that never retry.
    pub fn none() -> Self {
        Self { retry_count: 0, backoff: BackoffStrategy::Fixed(Duration::ZERO) }
    }

    /// Total attempts a transport will make: the first call plus retries.
    pub fn attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Delay before the retry following the given zero-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.calculate_delay(attempt)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::InvalidConfiguration`] on a non-positive
    /// exponential base.
    pub fn validate(&self) -> Result<(), RetryError> {
        if let BackoffStrategy::Exponential { base, .. } = &self.backoff {
            if *base <= 0.0 {
                return Err(RetryError::InvalidConfiguration {
                    message: "exponential base must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Pre-defined retry policies for common scenarios
pub mod policies {
    use super::{RetryDecision, RetryPolicy};

    /// Always retry policy - retries on any error
    #[derive(Debug, Clone)]
    pub struct AlwaysRetry;

    impl<E> RetryPolicy<E> for AlwaysRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Retry
        }
    }

    /// Never retry policy - never retries
    #[derive(Debug, Clone)]
    pub struct NeverRetry;

    impl<E> RetryPolicy<E> for NeverRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Stop
        }
    }

    /// Predicate-based retry policy
    #[derive(Debug)]
    pub struct PredicateRetry<F> {
        predicate: F,
    }

    impl<F> PredicateRetry<F> {
        /// Policy retrying whenever the predicate returns true.
        pub fn new(predicate: F) -> Self {
            Self { predicate }
        }
    }

    impl<F, E> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E, u32) -> bool + Send + Sync,
    {
        fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
            if (self.predicate)(error, attempt) {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }
}
