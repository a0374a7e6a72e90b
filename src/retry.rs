//! Explicit retry policy for API calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::api::ApiError;
use crate::config::RetryConfig;

/// Predicate deciding whether a failed status may be retried.
pub type RetryableStatus = fn(u16) -> bool;

/// Client errors (400-499) are caller mistakes and never retried; everything
/// else, including transport failures (status 0), is.
pub fn is_transient_status(status: u16) -> bool {
  !(400..500).contains(&status)
}

/// `{max_attempts, retryable}` plus exponential backoff between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  /// Total attempts including the first; at least 1
  pub max_attempts: u32,
  pub retryable: RetryableStatus,
  pub base_delay: Duration,
  pub max_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::new(3)
  }
}

impl RetryPolicy {
  pub fn new(max_attempts: u32) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      retryable: is_transient_status,
      base_delay: Duration::from_secs(1),
      max_delay: Duration::from_secs(30),
    }
  }

  /// A single attempt, never retried.
  pub fn never() -> Self {
    Self::new(1)
  }

  pub fn with_retryable(mut self, retryable: RetryableStatus) -> Self {
    self.retryable = retryable;
    self
  }

  pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
    self.base_delay = base_delay;
    self.max_delay = max_delay;
    self
  }

  /// Policy for reads, from configuration.
  pub fn queries(config: &RetryConfig) -> Self {
    Self::new(config.query_attempts).with_backoff(
      Duration::from_millis(config.base_delay_ms),
      Duration::from_millis(config.max_delay_ms),
    )
  }

  /// Policy for writes, from configuration.
  pub fn mutations(config: &RetryConfig) -> Self {
    Self::new(config.mutation_attempts).with_backoff(
      Duration::from_millis(config.base_delay_ms),
      Duration::from_millis(config.max_delay_ms),
    )
  }

  pub fn should_retry(&self, attempt: u32, error: &ApiError) -> bool {
    attempt < self.max_attempts && (self.retryable)(error.status)
  }

  /// Delay before the attempt following `attempt` (1-based).
  pub fn delay_for(&self, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    self.base_delay.saturating_mul(factor).min(self.max_delay)
  }

  /// Run `op` until it succeeds, fails with a non-retryable status, or the
  /// attempt budget is spent. The last error is returned as-is.
  pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ApiError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    let mut attempt = 1;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(err) if self.should_retry(attempt, &err) => {
          let delay = self.delay_for(attempt);
          warn!(
            attempt,
            max_attempts = self.max_attempts,
            status = err.status,
            code = %err.code,
            delay_ms = delay.as_millis() as u64,
            "request failed, retrying"
          );
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(err) => return Err(err),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  fn counting_op(
    status: u16,
    calls: Arc<AtomicU32>,
  ) -> impl FnMut() -> std::future::Ready<Result<(), ApiError>> {
    move || {
      calls.fetch_add(1, Ordering::SeqCst);
      std::future::ready(Err(ApiError::new(status, "X", "failed")))
    }
  }

  #[tokio::test(start_paused = true)]
  async fn client_errors_are_attempted_once() {
    let calls = Arc::new(AtomicU32::new(0));
    let err = RetryPolicy::new(3)
      .run(counting_op(404, calls.clone()))
      .await
      .unwrap_err();
    assert_eq!(err.status, 404);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn server_errors_use_the_full_budget() {
    let calls = Arc::new(AtomicU32::new(0));
    let err = RetryPolicy::new(3)
      .run(counting_op(503, calls.clone()))
      .await
      .unwrap_err();
    assert_eq!(err.status, 503);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn network_errors_are_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    RetryPolicy::new(2)
      .run(counting_op(0, calls.clone()))
      .await
      .unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn recovers_after_transient_failure() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let value = RetryPolicy::new(3)
      .run(move || {
        let n = c.fetch_add(1, Ordering::SeqCst);
        async move {
          if n == 0 {
            Err(ApiError::new(500, "X", "boom"))
          } else {
            Ok(n)
          }
        }
      })
      .await
      .unwrap();
    assert_eq!(value, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn backoff_doubles_and_caps() {
    let policy = RetryPolicy::new(10).with_backoff(Duration::from_secs(1), Duration::from_secs(5));
    assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for(2), Duration::from_secs(2));
    assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    assert_eq!(policy.delay_for(4), Duration::from_secs(5));
  }

  #[test]
  fn custom_predicate() {
    let policy = RetryPolicy::new(3).with_retryable(|s| s == 429);
    assert!(policy.should_retry(1, &ApiError::new(429, "X", "slow down")));
    assert!(!policy.should_retry(1, &ApiError::new(503, "X", "down")));
    assert!(!policy.should_retry(3, &ApiError::new(429, "X", "slow down")));
  }
}
