//! Retry policy for transport failures
//!
//! The crawler never gives up on a page in production: a transport error
//! blocks the current key until the remote API answers again. The policy is
//! still an explicit value so tests can swap in a bounded one.

use crate::config::{BackoffShape, CrawlerConfig};
use std::time::Duration;

/// Backoff schedule applied between attempts of the same page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    base: Duration,
    max_delay: Duration,
    shape: BackoffShape,
    max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Same delay after every failure, retried forever
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            base: delay,
            max_delay: delay,
            shape: BackoffShape::Fixed,
            max_attempts: None,
        }
    }

    /// Doubling delay capped at `max_delay`, retried forever
    pub const fn exponential(base: Duration, max_delay: Duration) -> Self {
        Self {
            base,
            max_delay,
            shape: BackoffShape::Exponential,
            max_attempts: None,
        }
    }

    /// Builds the production policy from crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        let base = Duration::from_millis(config.error_delay);
        let max_delay = Duration::from_millis(config.max_error_delay());
        match config.backoff {
            BackoffShape::Fixed => Self::fixed(base),
            BackoffShape::Exponential => Self::exponential(base, max_delay),
        }
    }

    /// Caps the number of attempts; the fetcher gives up once reached
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Whether another attempt is allowed after `attempts` failed ones
    pub fn should_retry(&self, attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts < max,
            None => true,
        }
    }

    /// Pause before the next attempt, given `failures` consecutive failures so far (1-based)
    pub fn delay(&self, failures: u32) -> Duration {
        match self.shape {
            BackoffShape::Fixed => self.base,
            BackoffShape::Exponential => {
                let exponent = failures.saturating_sub(1).min(20);
                self.base
                    .saturating_mul(2u32.saturating_pow(exponent))
                    .min(self.max_delay)
            }
        }
    }
}
