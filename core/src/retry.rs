// core/src/retry.rs

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::StoreResult;

/// Bounded exponential backoff for units of work that hit transient storage failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
  /// Total attempts including the first one. `1` disables retrying.
  pub max_attempts: u32,
  pub base_delay: Duration,
  pub max_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      base_delay: Duration::from_millis(50),
      max_delay: Duration::from_secs(2),
    }
  }
}

impl RetryPolicy {
  pub fn no_retry() -> Self {
    Self {
      max_attempts: 1,
      ..Self::default()
    }
  }

  /// Delay before retry number `retry` (1-based): base, 2×base, 4×base, … capped at `max_delay`.
  pub fn delay_for(&self, retry: u32) -> Duration {
    if retry == 0 {
      return Duration::ZERO;
    }
    let factor = 2u32.saturating_pow(retry - 1);
    self.base_delay.saturating_mul(factor).min(self.max_delay)
  }

  /// Runs `operation` until it succeeds, fails with a non-transient error, or attempts run out.
  pub async fn run<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> StoreResult<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
  {
    let max_attempts = self.max_attempts.max(1);
    let mut attempt = 1;
    loop {
      match operation().await {
        Err(err) if err.is_transient() && attempt < max_attempts => {
          let delay = self.delay_for(attempt);
          warn!(
            operation = operation_name,
            attempt,
            ?delay,
            error = %err,
            "Transient storage failure, retrying."
          );
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        outcome => return outcome,
      }
    }
  }
}
