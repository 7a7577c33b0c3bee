//! Engine configuration.

use std::time::Duration;

use crate::error::{EngineError, Result};

/// Upper bound on concurrent store calls per level.
pub const MAX_WORKER_LIMIT: usize = 64;

/// Upper bound on attempts for a single read.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Retry behavior for idempotent reads. Writes are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap on any single delay (before jitter).
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// Doubles per attempt up to `max_delay`, then adds jitter of up to half
    /// the delay derived from `jitter_seed`.
    pub fn backoff(&self, attempt: u32, jitter_seed: u64) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;

        let shift = attempt.saturating_sub(1).min(32);
        let delay_ms = base_ms.saturating_mul(1u64 << shift).min(max_ms);

        let max_jitter = delay_ms / 2 + 1;
        let jitter_ms = jitter_seed % max_jitter;

        Duration::from_millis(delay_ms.saturating_add(jitter_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Configuration for discovery and regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum concurrent store calls within one level.
    pub worker_limit: usize,
    /// Deepest level below the root that may be discovered.
    pub max_depth: usize,
    /// Bound on each individual store call.
    pub request_timeout: Duration,
    /// Retry policy for `list_signed_by`.
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_limit: 4,
            max_depth: 16,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.worker_limit == 0 || self.worker_limit > MAX_WORKER_LIMIT {
            return Err(EngineError::InvalidConfig(format!(
                "worker limit must be between 1 and {}, got {}",
                MAX_WORKER_LIMIT, self.worker_limit
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(EngineError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }
        if self.retry.max_attempts == 0 || self.retry.max_attempts > MAX_RETRY_ATTEMPTS {
            return Err(EngineError::InvalidConfig(format!(
                "retry attempts must be between 1 and {}, got {}",
                MAX_RETRY_ATTEMPTS, self.retry.max_attempts
            )));
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(EngineError::InvalidConfig(
                "retry base delay exceeds max delay".into(),
            ));
        }
        Ok(())
    }
}
