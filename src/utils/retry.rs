//! Retry policy and wrapper for flaky feed requests.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::sources::SourceError;

/// How the delay grows with each retry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// `step * retry`
    Linear,
    /// `step * 2^(retry - 1)`
    Exponential,
}

impl Backoff {
    /// Delay before retry number `retry` (1-based)
    pub fn delay(&self, step: Duration, retry: u32) -> Duration {
        match self {
            Backoff::Linear => step.saturating_mul(retry),
            Backoff::Exponential => step.saturating_mul(2u32.saturating_pow(retry.saturating_sub(1))),
        }
    }
}

/// Retry configuration for one logical request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Base delay when the server reports it is unavailable
    pub unavailable_step: Duration,
    /// Base delay for connection and transport failures
    pub failure_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Backoff::Linear,
            unavailable_step: Duration::from_secs(10),
            failure_step: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy that never waits between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Linear,
            unavailable_step: Duration::ZERO,
            failure_step: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` for a transient failure
    pub fn delay_for(&self, error: &TransientError, retry: u32) -> Duration {
        let step = match error {
            TransientError::ServiceUnavailable => self.unavailable_step,
            TransientError::Network => self.failure_step,
        };
        self.backoff.delay(step, retry)
    }
}

/// Failures worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientError {
    /// HTTP 503 from the feed server
    ServiceUnavailable,
    /// Connection, transport or body read failure
    Network,
}

impl TransientError {
    /// Classify a source error; other HTTP statuses and parse errors are permanent
    pub fn from_source_error(err: &SourceError) -> Option<Self> {
        match err {
            SourceError::ServiceUnavailable => Some(TransientError::ServiceUnavailable),
            SourceError::Network(_) => Some(TransientError::Network),
            _ => None,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or attempts run out.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::info!(
                        "Request succeeded on attempt {} after {} transient failures",
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(result);
            }
            Err(error) => {
                let Some(transient) = TransientError::from_source_error(&error) else {
                    return Err(error);
                };

                if attempts >= policy.max_attempts {
                    tracing::warn!(
                        "Giving up after {} attempts: {}",
                        attempts,
                        error
                    );
                    return Err(error);
                }

                let delay = policy.delay_for(&transient, attempts);
                tracing::warn!(
                    "{} (retry {}/{}), waiting {:?}",
                    error,
                    attempts,
                    policy.max_attempts,
                    delay
                );
                sleep(delay).await;
            }
        }
    }
}
