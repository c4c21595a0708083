//! Resilient generation with bounded exponential backoff.
//!
//! Wraps an `LlmClient` in an explicit retry loop. Only rate-limit and
//! transient failures are retried; auth and malformed-request failures
//! surface immediately. When the attempt budget is exhausted the caller
//! receives a single user-facing capacity message (`AppError::Overloaded`)
//! distinct from other fatal errors.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tutor_core::{AppError, AppResult};
use tutor_core::config::RetryConfig;

/// User-facing message shown when the retry budget runs out.
pub const CAPACITY_MESSAGE: &str =
    "The tutor is overwhelmed! Too many questions at once. Please wait a minute and try again.";

/// Retry policy for generation calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,

    /// Initial backoff delay
    pub initial_delay: Duration,

    /// Maximum backoff delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_secs(config.initial_delay_secs),
            max_delay: Duration::from_secs(config.max_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Base delay before the given retry, exponential and clamped.
    ///
    /// `attempt` is 1-based and names the attempt that just failed.
    fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let delay = self.initial_delay.saturating_mul(factor);
        delay.min(self.max_delay)
    }

    /// Backoff delay with random jitter, still clamped to `max_delay`.
    fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter_bound = base.as_millis() as u64 / 2;
        let jitter = if jitter_bound > 0 {
            rand::thread_rng().gen_range(0..=jitter_bound)
        } else {
            0
        };
        (base + Duration::from_millis(jitter)).min(self.max_delay)
    }
}

/// Injectable delay source so the retry loop is testable without
/// wall-clock time.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Resilient generator: an `LlmClient` plus a retry policy.
pub struct Generator {
    client: Arc<dyn LlmClient>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Generator {
    /// Create a generator with the production tokio sleeper.
    pub fn new(client: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        Self::with_sleeper(client, policy, Arc::new(TokioSleeper))
    }

    /// Create a generator with an injected sleeper (used by tests).
    pub fn with_sleeper(
        client: Arc<dyn LlmClient>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            client,
            policy,
            sleeper,
        }
    }

    /// Generate a completion, retrying retryable failures.
    ///
    /// State machine: attempt -> success, or retryable failure -> backoff
    /// -> attempt, or fatal failure -> error. Each attempt is independent;
    /// a failed attempt's output is discarded.
    pub async fn generate(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let mut attempt = 1u32;

        loop {
            match self.client.complete(request).await {
                Ok(response) => {
                    tracing::debug!(attempt, "Generation succeeded");
                    return Ok(response);
                }
                Err(err) if err.is_retryable() => {
                    if attempt >= self.policy.max_attempts {
                        tracing::warn!(
                            attempts = attempt,
                            error = %err,
                            "Generation retry budget exhausted"
                        );
                        return Err(AppError::Overloaded(CAPACITY_MESSAGE.to_string()));
                    }

                    let delay = self.policy.jittered_delay(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Generation attempt failed, backing off"
                    );

                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(attempt, error = %err, "Fatal generation failure");
                    return Err(err);
                }
            }
        }
    }
}
