//! Retry and provider-failover control around a single page's processing
//!
//! Retries are plain control flow: an attempt loop with a computed backoff,
//! driven by the explicit transient/terminal tag on `PageError`. Transient
//! failures (timeouts, malformed model output) retry on the same provider up
//! to the configured budget; once the budget is spent, the next provider in
//! the ordered list gets one fresh budget of its own. There is no
//! alternation back to an exhausted provider.

use std::future::Future;
use std::time::Duration;

use crate::crawl::types::PageError;

/// Retry budget and backoff curve
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries per provider, on top of the initial attempt
    pub max_retries: u32,

    /// First backoff delay; doubles on each subsequent retry
    pub backoff_base: Duration,

    /// Upper bound on a single backoff sleep
    pub backoff_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based)
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_cap)
    }
}

/// Runs `op` against each provider in order until one succeeds
///
/// `op` is the full process-one-page pipeline parameterized by a provider.
/// Returns the last error once every provider's budget is exhausted; the
/// caller records it against the URL and moves on, since a single page's
/// failure never aborts the crawl.
pub async fn run_with_fallback<'a, T, P, F, Fut>(
    policy: &RetryPolicy,
    providers: &'a [P],
    mut op: F,
) -> Result<T, PageError>
where
    F: FnMut(&'a P) -> Fut,
    Fut: Future<Output = Result<T, PageError>>,
{
    debug_assert!(!providers.is_empty());
    let mut last_err = PageError::Extraction {
        message: "no provider configured".to_string(),
        transient: false,
    };

    for (provider_idx, provider) in providers.iter().enumerate() {
        if provider_idx > 0 {
            tracing::info!("Swapping to fallback provider (attempt budget reset)");
        }

        let mut attempt = 0u32;
        loop {
            match op(provider).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let transient = err.is_transient();
                    last_err = err;

                    if !transient {
                        tracing::warn!("Terminal failure: {}", last_err);
                        break;
                    }

                    attempt += 1;
                    if attempt > policy.max_retries {
                        tracing::warn!(
                            "Retry budget exhausted after {} attempts: {}",
                            attempt,
                            last_err
                        );
                        break;
                    }

                    let delay = policy.backoff(attempt);
                    tracing::info!(
                        "Transient failure ({}), retry {}/{} in {:?}",
                        last_err,
                        attempt,
                        policy.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_base: Duration::from_millis(1),
            backoff_cap: Duration::from_millis(4),
        }
    }

    fn transient(msg: &str) -> PageError {
        PageError::Extraction {
            message: msg.to_string(),
            transient: true,
        }
    }

    fn terminal(msg: &str) -> PageError {
        PageError::Fetch {
            message: msg.to_string(),
            transient: false,
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let calls = AtomicU32::new(0);
        let result = run_with_fallback(&fast_policy(2), &["primary"], |_| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, PageError>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_retry_same_provider() {
        let calls = AtomicU32::new(0);
        let result = run_with_fallback(&fast_policy(2), &["primary"], |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient("bad JSON"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fallback_invoked_exactly_once_after_exhaustion() {
        let primary_calls = AtomicU32::new(0);
        let fallback_calls = AtomicU32::new(0);

        let result = run_with_fallback(&fast_policy(2), &["primary", "fallback"], |p| {
            let is_primary = *p == "primary";
            if is_primary {
                primary_calls.fetch_add(1, Ordering::SeqCst);
            } else {
                fallback_calls.fetch_add(1, Ordering::SeqCst);
            }
            async move {
                if is_primary {
                    Err(transient("primary fails"))
                } else {
                    Ok("fallback result")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "fallback result");
        // 1 initial + 2 retries on primary, one single fallback call
        assert_eq!(primary_calls.load(Ordering::SeqCst), 3);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_terminal_failure_skips_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = run_with_fallback(&fast_policy(5), &["primary"], |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(terminal("404")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_providers_exhausted_returns_last_error() {
        let result: Result<(), _> =
            run_with_fallback(&fast_policy(0), &["primary", "fallback"], |p| {
                let msg = format!("{} fails", p);
                async move { Err(transient(&msg)) }
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("fallback fails"));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            backoff_base: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(5),
        };
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(5));
    }
}
