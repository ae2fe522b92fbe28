// Retry logic for submissions that lost a duplicate-key race
use super::settings::Settings;
use crate::error::{AppError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after this delay
    Retry(Duration),
    /// Do not retry, surface the error
    GiveUp,
}

/// Decides whether a failed submission should be attempted again.
///
/// Only `DuplicateSubmission` is retryable. Rejections are decisions, not
/// errors, and never reach this policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `max_attempts` - Total attempts including the first one
    /// * `base_delay_ms` - Delay before the first retry, doubled each time
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.duplicate_retry_attempts,
            settings.duplicate_retry_base_delay_ms,
        )
    }

    /// Decide what to do after `attempt` (1-based) failed with `error`
    ///
    /// Backoff: delay = base_delay * 2^(attempt - 1) * (0.9..=1.1)
    pub fn should_retry(&self, error: &AppError, attempt: u32) -> RetryDecision {
        if !error.is_retryable() {
            return RetryDecision::GiveUp;
        }

        if attempt >= self.max_attempts {
            warn!(
                attempt = attempt,
                max_attempts = self.max_attempts,
                error = %error,
                "Max retry attempts reached"
            );
            return RetryDecision::GiveUp;
        }

        let exponent = attempt.saturating_sub(1).min(16);
        let base = self.base_delay_ms.saturating_mul(1u64 << exponent) as f64;

        // Deterministic jitter keyed on the conflicting participant
        let jitter_seed = match error {
            AppError::DuplicateSubmission { participant_id, .. } => {
                participant_id.chars().map(|c| c as u32).sum::<u32>()
            }
            _ => 0,
        };
        let jitter_factor = 0.9 + ((jitter_seed.wrapping_add(attempt) % 21) as f64 / 100.0);
        let delay = Duration::from_millis((base * jitter_factor) as u64);

        info!(
            attempt = attempt,
            max_attempts = self.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Scheduling retry"
        );

        RetryDecision::Retry(delay)
    }

    /// Run `operation` until it succeeds, fails permanently, or runs out of
    /// attempts
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => match self.should_retry(&e, attempt) {
                    RetryDecision::Retry(delay) => {
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::GiveUp => return Err(e),
                },
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio_test::{assert_err, assert_ok};

    fn duplicate() -> AppError {
        AppError::DuplicateSubmission {
            participant_id: "alice".to_string(),
            submitted_at: 1_000,
        }
    }

    #[test]
    fn test_only_duplicates_are_retried() {
        let policy = RetryPolicy::new(3, 100);
        assert_eq!(
            policy.should_retry(&AppError::Persistence("disk".into()), 1),
            RetryDecision::GiveUp
        );
        assert!(matches!(
            policy.should_retry(&duplicate(), 1),
            RetryDecision::Retry(_)
        ));
    }

    #[test]
    fn test_backoff_grows_and_stops() {
        let policy = RetryPolicy::new(3, 100);
        let first = match policy.should_retry(&duplicate(), 1) {
            RetryDecision::Retry(d) => d,
            RetryDecision::GiveUp => panic!("expected retry"),
        };
        let second = match policy.should_retry(&duplicate(), 2) {
            RetryDecision::Retry(d) => d,
            RetryDecision::GiveUp => panic!("expected retry"),
        };
        assert!(first >= Duration::from_millis(90) && first <= Duration::from_millis(110));
        assert!(second >= Duration::from_millis(180) && second <= Duration::from_millis(220));
        assert_eq!(policy.should_retry(&duplicate(), 3), RetryDecision::GiveUp);
    }

    #[test]
    fn test_run_retries_until_success() {
        let policy = RetryPolicy::new(3, 10);
        let calls = AtomicU32::new(0);

        let result = tokio_test::block_on(policy.run(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(duplicate())
                } else {
                    Ok(n)
                }
            }
        }));

        assert_eq!(assert_ok!(result), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_run_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(2, 1);
        let calls = AtomicU32::new(0);

        let result: Result<()> = tokio_test::block_on(policy.run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(duplicate()) }
        }));

        assert!(assert_err!(result).is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_run_surfaces_permanent_error() {
        let policy = RetryPolicy::new(5, 10);
        let calls = AtomicU32::new(0);

        let result: Result<()> = tokio_test::block_on(policy.run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::Validation("bad".into())) }
        }));

        assert!(matches!(assert_err!(result), AppError::Validation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
