//! Bounded retry with backoff for generation calls.
//!
//! The transient/terminal boundary is an explicit, overridable
//! classification table on [`RetryPolicy`] rather than exception-driven
//! control flow: throttling, timeouts and server-side failures are
//! retried; auth, model-not-found and malformed-request errors are not.

use std::time::{Duration, Instant};

use aeroqa_core::{GenerationFailureReason, QaError, QaResult};
use tracing::warn;

use crate::client::{GenerationClient, GenerationRequest, GenerationResponse};

/// How a failed generation attempt should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth another attempt after backoff
    Transient,
    /// Propagate immediately
    Terminal,
}

/// Default transient/terminal classification.
///
/// Timeouts are handled by the retry loop itself and never reach this
/// table.
pub fn default_classification(error: &QaError) -> ErrorClass {
    match error {
        QaError::GenerationFailure { reason, .. } => match reason {
            GenerationFailureReason::Throttled | GenerationFailureReason::Remote => {
                ErrorClass::Transient
            }
            GenerationFailureReason::Unauthorized
            | GenerationFailureReason::ModelNotFound
            | GenerationFailureReason::BadRequest => ErrorClass::Terminal,
        },
        _ => ErrorClass::Terminal,
    }
}

/// Retry policy for the generation client.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first (must be >= 1)
    pub max_attempts: u32,

    /// Backoff before the second attempt; doubles per retry
    pub initial_backoff: Duration,

    /// Per-attempt timeout; an expired attempt counts as transient
    pub request_timeout: Duration,

    /// Transient/terminal classification table
    pub classify: fn(&QaError) -> ErrorClass,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            request_timeout: Duration::from_secs(30),
            classify: default_classification,
        }
    }
}

impl RetryPolicy {
    /// Build a policy with the given attempt budget and timeout, keeping
    /// the default backoff and classification table.
    pub fn new(max_attempts: u32, request_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            request_timeout,
            ..Self::default()
        }
    }

    /// Backoff duration before the given retry (1-based attempt count).
    fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2_u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Decorator adding retry, backoff and per-attempt timeouts to any
/// [`GenerationClient`].
///
/// Parameter validation happens once, before the first attempt, so a
/// request guaranteed to fail never costs a network round trip.
pub struct RetryingClient<C: GenerationClient> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: GenerationClient> RetryingClient<C> {
    /// Wrap a client with the given retry policy.
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl<C: GenerationClient> GenerationClient for RetryingClient<C> {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    async fn generate(&self, request: &GenerationRequest) -> QaResult<GenerationResponse> {
        request.validate()?;

        let started = Instant::now();
        let mut attempt = 0u32;
        let mut timed_out = 0u32;
        let mut last_error: Option<QaError> = None;

        while attempt < self.policy.max_attempts {
            attempt += 1;

            match tokio::time::timeout(self.policy.request_timeout, self.inner.generate(request))
                .await
            {
                Ok(Ok(mut response)) => {
                    // Report cumulative latency including earlier failed attempts
                    response.elapsed_ms = started.elapsed().as_millis() as u64;
                    return Ok(response);
                }
                Ok(Err(error)) => {
                    if (self.policy.classify)(&error) == ErrorClass::Terminal {
                        return Err(error);
                    }
                    warn!(
                        "Generation attempt {}/{} failed: {}",
                        attempt, self.policy.max_attempts, error
                    );
                    last_error = Some(error);
                }
                Err(_elapsed) => {
                    timed_out += 1;
                    warn!(
                        "Generation attempt {}/{} timed out after {:?}",
                        attempt, self.policy.max_attempts, self.policy.request_timeout
                    );
                    last_error = None;
                }
            }

            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.backoff_for(attempt)).await;
            }
        }

        // Budget exhausted: distinguish a timeout-dominated failure from a
        // remote one so the caller gets an actionable error kind.
        if timed_out > 0 && last_error.is_none() {
            Err(QaError::GenerationTimeout { attempts: attempt })
        } else {
            Err(last_error.unwrap_or(QaError::GenerationTimeout { attempts: attempt }))
        }
    }

    async fn ping(&self) -> QaResult<()> {
        self.inner.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Test client that fails a scripted number of times before succeeding.
    struct FlakyClient {
        calls: AtomicU32,
        failures_before_success: u32,
        failure: fn() -> QaError,
        hang: bool,
    }

    impl FlakyClient {
        fn failing(failures_before_success: u32, failure: fn() -> QaError) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures_before_success,
                failure,
                hang: false,
            }
        }

        fn hanging(failures_before_success: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures_before_success,
                failure: || unreachable!(),
                hang: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl GenerationClient for FlakyClient {
        fn provider_name(&self) -> &str {
            "flaky"
        }

        async fn generate(&self, _request: &GenerationRequest) -> QaResult<GenerationResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                if self.hang {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                return Err((self.failure)());
            }
            Ok(GenerationResponse {
                text: "answer".to_string(),
                model: "test".to_string(),
                usage: Default::default(),
                elapsed_ms: 0,
            })
        }

        async fn ping(&self) -> QaResult<()> {
            Ok(())
        }
    }

    fn throttled() -> QaError {
        QaError::GenerationFailure {
            reason: GenerationFailureReason::Throttled,
            message: "slow down".to_string(),
        }
    }

    fn unauthorized() -> QaError {
        QaError::GenerationFailure {
            reason: GenerationFailureReason::Unauthorized,
            message: "denied".to_string(),
        }
    }

    fn tiny_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            request_timeout: Duration::from_millis(50),
            classify: default_classification,
        }
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let client = RetryingClient::new(FlakyClient::failing(2, throttled), tiny_policy(3));
        let response = client
            .generate(&GenerationRequest::new("p", "m"))
            .await
            .unwrap();
        assert_eq!(response.text, "answer");
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_failure_not_retried() {
        let client = RetryingClient::new(FlakyClient::failing(2, unauthorized), tiny_policy(3));
        let err = client
            .generate(&GenerationRequest::new("p", "m"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "generation_failure");
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeouts_within_budget_then_success() {
        // Two attempts hang past the per-attempt timeout, third succeeds.
        let client = RetryingClient::new(FlakyClient::hanging(2), tiny_policy(3));
        let response = client
            .generate(&GenerationRequest::new("p", "m"))
            .await
            .unwrap();
        assert_eq!(response.text, "answer");
        // Cumulative latency covers the two timed-out attempts.
        assert!(response.elapsed_ms >= 100);
    }

    #[tokio::test]
    async fn test_exhausted_timeout_budget() {
        let client = RetryingClient::new(FlakyClient::hanging(10), tiny_policy(2));
        let err = client
            .generate(&GenerationRequest::new("p", "m"))
            .await
            .unwrap_err();
        match err {
            QaError::GenerationTimeout { attempts } => assert_eq!(attempts, 2),
            other => panic!("expected GenerationTimeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transient_budget_exhausted_returns_last_error() {
        let client = RetryingClient::new(FlakyClient::failing(10, throttled), tiny_policy(2));
        let err = client
            .generate(&GenerationRequest::new("p", "m"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "generation_failure");
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_parameters_skip_network() {
        let client = RetryingClient::new(FlakyClient::failing(0, throttled), tiny_policy(3));
        let request = GenerationRequest::new("p", "m").with_max_tokens(0);
        let err = client.generate(&request).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_generation_parameters");
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = tiny_policy(5);
        assert_eq!(policy.backoff_for(1), Duration::from_millis(1));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(2));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(4));
    }

    #[test]
    fn test_default_classification_table() {
        assert_eq!(default_classification(&throttled()), ErrorClass::Transient);
        assert_eq!(default_classification(&unauthorized()), ErrorClass::Terminal);
        assert_eq!(
            default_classification(&QaError::InvalidInput("q".into())),
            ErrorClass::Terminal
        );
    }
}
