use crate::errors::{BotError, BotResult};
use crate::metrics::metrics;
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry configuration with a flat jittered backoff window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including initial attempt)
    pub max_attempts: u32,
    /// Lower bound of the backoff window
    pub backoff_min: Duration,
    /// Upper bound of the backoff window
    pub backoff_max: Duration,
    /// Whether non-transient errors also consume a retry slot and retry
    pub retry_non_transient: bool,
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_min: Duration::from_millis(2_000),
            backoff_max: Duration::from_millis(4_000),
            retry_non_transient: false,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Decide the fate of a failed attempt (`attempt` is 1-based).
    pub fn decide(&self, error: &BotError, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts || error.is_fatal() {
            return RetryDecision::GiveUp;
        }
        if error.is_transient() || self.retry_non_transient {
            RetryDecision::Retry(self.backoff())
        } else {
            RetryDecision::GiveUp
        }
    }

    /// Uniform random delay inside the backoff window. Independent per attempt.
    pub fn backoff(&self) -> Duration {
        let min = self.backoff_min.as_millis() as u64;
        let max = self.backoff_max.as_millis() as u64;
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Central retry helper.
///
/// Runs `operation` with the 1-based attempt number until it succeeds or the
/// policy gives up; the last error is returned in that case. The operation is
/// never invoked more than `policy.max_attempts` times.
pub async fn retry_with_backoff<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> BotResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = BotResult<T>>,
{
    let start_time = Instant::now();
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempts = attempt,
                        duration_ms = start_time.elapsed().as_millis() as u64,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => match policy.decide(&err, attempt) {
                RetryDecision::Retry(backoff) => {
                    if err.is_transient() {
                        warn!(
                            operation = operation_name,
                            attempt,
                            error = %err,
                            "⚠️ 502 Bad Gateway, retrying"
                        );
                    } else {
                        warn!(
                            operation = operation_name,
                            attempt,
                            error = %err,
                            "Attempt failed, retrying"
                        );
                    }
                    warn!(
                        operation = operation_name,
                        "⏳ Waiting {:.2}s before retry...",
                        backoff.as_secs_f64()
                    );
                    metrics().retries_total.inc();
                    sleep(backoff).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp => {
                    if attempt >= policy.max_attempts && policy.max_attempts > 1 {
                        warn!(
                            operation = operation_name,
                            attempts = attempt,
                            error = %err,
                            "❌ Exceeded max retries ({}), skipping",
                            policy.max_attempts
                        );
                    } else {
                        warn!(
                            operation = operation_name,
                            attempts = attempt,
                            error = %err,
                            "Giving up"
                        );
                    }
                    return Err(err);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32, retry_non_transient: bool) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_min: Duration::ZERO,
            backoff_max: Duration::ZERO,
            retry_non_transient,
        }
    }

    fn gateway() -> BotError {
        BotError::TransientNetwork {
            message: "502 Bad Gateway".into(),
        }
    }

    #[test]
    fn test_backoff_stays_in_window() {
        let policy = RetryPolicy::default();
        for _ in 0..1_000 {
            let delay = policy.backoff();
            assert!(delay >= Duration::from_millis(2_000));
            assert!(delay <= Duration::from_millis(4_000));
        }
    }

    #[test]
    fn test_decide_transient_until_ceiling() {
        let policy = fast_policy(3, false);
        assert!(matches!(policy.decide(&gateway(), 1), RetryDecision::Retry(_)));
        assert!(matches!(policy.decide(&gateway(), 2), RetryDecision::Retry(_)));
        assert_eq!(policy.decide(&gateway(), 3), RetryDecision::GiveUp);
    }

    #[test]
    fn test_decide_non_transient_respects_flag() {
        let err = BotError::from_rpc_message("execution reverted");
        assert_eq!(fast_policy(5, false).decide(&err, 1), RetryDecision::GiveUp);
        assert!(matches!(
            fast_policy(5, true).decide(&err, 1),
            RetryDecision::Retry(_)
        ));
        assert_eq!(fast_policy(5, true).decide(&err, 5), RetryDecision::GiveUp);
    }

    #[test]
    fn test_configuration_errors_never_retry() {
        let err = BotError::Configuration("bad".into());
        assert_eq!(fast_policy(5, true).decide(&err, 1), RetryDecision::GiveUp);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff("test", &fast_policy(5, false), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 5 {
                    Err(gateway())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_retry_never_exceeds_ceiling() {
        let calls = AtomicU32::new(0);
        let result: BotResult<()> = retry_with_backoff("test", &fast_policy(3, true), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(gateway()) }
        })
        .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: BotResult<()> = retry_with_backoff("test", &fast_policy(5, false), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(BotError::from_rpc_message("execution reverted")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
