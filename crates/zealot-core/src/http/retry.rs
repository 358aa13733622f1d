//! Retry logic for transport-level failures
//!
//! Only failures that produced no response are retried. Error statuses are
//! returned to the classifier untouched.

use crate::http::error::TransportFailure;
use backoff::backoff::{Backoff, Constant};
use reqwest::Method;
use std::time::Duration;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of sends, the first one included
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom settings
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Set the delay between attempts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Policy that never retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    fn create_backoff(&self) -> Constant {
        Constant::new(self.delay)
    }
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay
    Retry { delay: Duration },
    /// Do not retry the request
    NoRetry,
}

/// Tracks the sends of a single request
#[derive(Debug)]
pub struct RetryHandler {
    policy: RetryPolicy,
    attempts: u32,
    backoff: Constant,
}

impl RetryHandler {
    pub fn new(policy: RetryPolicy) -> Self {
        let backoff = policy.create_backoff();
        Self {
            policy,
            attempts: 1,
            backoff,
        }
    }

    /// Determine if a request should be retried after a failure
    pub fn should_retry(&mut self, failure: &TransportFailure, method: &Method) -> RetryDecision {
        if self.attempts >= self.policy.max_attempts {
            return RetryDecision::NoRetry;
        }

        if !failure.is_retryable(method) {
            return RetryDecision::NoRetry;
        }

        self.attempts += 1;

        let delay = self.backoff.next_backoff().unwrap_or(self.policy.delay);
        RetryDecision::Retry { delay }
    }

    /// Number of sends so far, counting the one a retry decision grants
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
