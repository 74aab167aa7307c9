// src/services/retry.rs
// DOCUMENTATION: Retry policy and sleep abstraction
// PURPOSE: Bounded exponential backoff with a clock the tests can replace

use async_trait::async_trait;
use std::time::Duration;

/// Bounds and delays for retrying upstream calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after a transient failure (attempts = retries + 1)
    pub max_retries: u32,
    /// Delay before the first transient retry
    pub base_backoff: Duration,
    /// Ceiling for any transient retry delay
    pub max_backoff: Duration,
    /// Retries after a rate-limit response
    pub max_quota_retries: u32,
    /// Wait after a rate-limit response that carries no hint
    pub quota_delay: Duration,
    /// Ceiling for any rate-limit wait, server hints included
    pub max_quota_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            max_quota_retries: 3,
            quota_delay: Duration::from_secs(2),
            max_quota_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before transient retry number `retry` (1-based)
    /// DOCUMENTATION: base * 2^(retry - 1), capped at max_backoff
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(20);
        self.base_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Delay after a rate-limit response, capped at max_quota_delay
    pub fn quota_wait(&self, retry_after: Option<Duration>) -> Duration {
        retry_after
            .unwrap_or(self.quota_delay)
            .min(self.max_quota_delay)
    }
}

/// Source of delays for the pipeline
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_until_cap() {
        let policy = RetryPolicy {
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(700),
            ..RetryPolicy::default()
        };

        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(4), Duration::from_millis(700));
        assert_eq!(policy.backoff_for(u32::MAX), Duration::from_millis(700));
    }

    #[test]
    fn test_quota_wait_prefers_server_hint() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.quota_wait(Some(Duration::from_secs(7))), Duration::from_secs(7));
        assert_eq!(policy.quota_wait(None), Duration::from_secs(2));
    }

    #[test]
    fn test_quota_wait_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.quota_wait(Some(Duration::from_secs(86_400))),
            Duration::from_secs(60)
        );

        let policy = RetryPolicy {
            quota_delay: Duration::from_secs(10),
            max_quota_delay: Duration::from_secs(5),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.quota_wait(None), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_tokio_sleeper_zero_returns_immediately() {
        TokioSleeper.sleep(Duration::ZERO).await;
        TokioSleeper.sleep(Duration::from_millis(1)).await;
    }
}
