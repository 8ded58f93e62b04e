use std::time::Duration;

use parrot_core::RequestError;

/// What to do after the `attempt`-th failure of a dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

/// Retry budget and backoff shape for one dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; a request runs at most `max_retries + 1` times.
    pub max_retries: u32,
    /// Added on top of every rate-limit wait.
    pub rate_limit_margin: Duration,
    /// Ceiling for the exponential wait used when the server gives no hint.
    pub backoff_cap: Duration,
    /// Transient failures wait `attempt * transient_step`.
    pub transient_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            rate_limit_margin: Duration::from_millis(250),
            backoff_cap: Duration::from_secs(60),
            transient_step: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// `attempt` is 1-based: the number of failures seen so far.
    pub fn decide(&self, attempt: u32, error: &RequestError) -> RetryDecision {
        if !error.is_retryable() || attempt > self.max_retries {
            return RetryDecision::GiveUp;
        }
        match error {
            RequestError::RateLimited { retry_after } => {
                let wait = retry_after.unwrap_or_else(|| self.exponential_wait(attempt));
                RetryDecision::Retry(wait.saturating_add(self.rate_limit_margin))
            }
            _ => RetryDecision::Retry(self.transient_step.saturating_mul(attempt)),
        }
    }

    fn exponential_wait(&self, attempt: u32) -> Duration {
        let secs = 2u64.saturating_pow(attempt);
        Duration::from_secs(secs).min(self.backoff_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate_limited(secs: Option<f64>) -> RequestError {
        RequestError::RateLimited {
            retry_after: secs.map(Duration::from_secs_f64),
        }
    }

    #[test]
    fn test_server_directed_wait_plus_margin() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(1, &rate_limited(Some(2.0))),
            RetryDecision::Retry(Duration::from_millis(2250))
        );
    }

    #[test]
    fn test_huge_waits_saturate_instead_of_overflowing() {
        let policy = RetryPolicy {
            transient_step: Duration::MAX,
            ..RetryPolicy::default()
        };
        let huge = RequestError::RateLimited {
            retry_after: Some(Duration::MAX),
        };
        assert_eq!(policy.decide(1, &huge), RetryDecision::Retry(Duration::MAX));
        assert_eq!(
            policy.decide(2, &RequestError::Transient("reset".into())),
            RetryDecision::Retry(Duration::MAX)
        );
    }

    #[test]
    fn test_fractional_server_wait() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(1, &rate_limited(Some(0.5))),
            RetryDecision::Retry(Duration::from_millis(750))
        );
    }

    #[test]
    fn test_exponential_wait_without_hint() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(1, &rate_limited(None)),
            RetryDecision::Retry(Duration::from_millis(2250))
        );
        assert_eq!(
            policy.decide(3, &rate_limited(None)),
            RetryDecision::Retry(Duration::from_millis(8250))
        );
    }

    #[test]
    fn test_exponential_wait_is_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            ..RetryPolicy::default()
        };
        assert_eq!(
            policy.decide(9, &rate_limited(None)),
            RetryDecision::Retry(Duration::from_millis(60_250))
        );
    }

    #[test]
    fn test_transient_linear_step() {
        let policy = RetryPolicy::default();
        let error = RequestError::Transient("503".into());
        assert_eq!(
            policy.decide(1, &error),
            RetryDecision::Retry(Duration::from_millis(500))
        );
        assert_eq!(
            policy.decide(4, &error),
            RetryDecision::Retry(Duration::from_millis(2000))
        );
    }

    #[test]
    fn test_gives_up_past_max_retries() {
        let policy = RetryPolicy::default();
        let error = RequestError::Transient("reset".into());
        assert!(matches!(policy.decide(5, &error), RetryDecision::Retry(_)));
        assert_eq!(policy.decide(6, &error), RetryDecision::GiveUp);
        assert_eq!(policy.decide(6, &rate_limited(Some(1.0))), RetryDecision::GiveUp);
    }

    #[test]
    fn test_permanent_never_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(1, &RequestError::Permanent("401".into())),
            RetryDecision::GiveUp
        );
    }
}
