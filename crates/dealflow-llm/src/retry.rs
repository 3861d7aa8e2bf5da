//! Bounded exponential backoff for completion calls.

use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

/// Configuration for retry behaviour on retryable completion errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay after failed attempt number `attempt` (1-based).
    ///
    /// A rate limit waits at least its `Retry-After`; every delay is capped
    /// at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, err: &LlmError) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1 << exp);
        let delay = match err {
            LlmError::RateLimited { retry_after_secs } => {
                backoff.max(Duration::from_secs(*retry_after_secs))
            }
            _ => backoff,
        };
        delay.min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < config.max_attempts => {
                let delay = config.delay_for(attempt, &err);
                tracing::warn!(attempt, delay_ms = delay.as_millis(), error = %err, "completion failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        let err = LlmError::Api { status: 500, message: String::new() };
        assert_eq!(config.delay_for(1, &err), Duration::from_millis(100));
        assert_eq!(config.delay_for(2, &err), Duration::from_millis(200));
        assert_eq!(config.delay_for(3, &err), Duration::from_millis(350));
    }

    #[test]
    fn rate_limit_waits_for_retry_after() {
        let config = RetryConfig::default();
        let err = LlmError::RateLimited { retry_after_secs: 4 };
        assert_eq!(config.delay_for(1, &err), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(&instant(), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LlmError::Api { status: 503, message: String::new() })
            } else {
                Ok("true")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "true");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(&instant(), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::RateLimited { retry_after_secs: 0 })
        })
        .await;
        assert!(matches!(result, Err(LlmError::RateLimited { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_fails_fast() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(&instant(), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Api { status: 400, message: "bad request".into() })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
