//! Visual-oracle contract for photograph-derived checks.
//!
//! The engine never names a model: photograph rules phrase yes/no or
//! short-answer questions, hand them plus image references to whatever
//! oracle the caller wired in, and classify the free-text answer. Transport
//! is retried with bounded exponential backoff; exhaustion is reported to
//! the orchestrator, which isolates the failure to the asking rule.

mod http;

pub use http::HttpVisualOracle;

use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle transport failure: {0}")]
    Transport(String),
    #[error("oracle returned a malformed payload: {0}")]
    Malformed(String),
    #[error("oracle exhausted {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: String },
}

/// External visual question-answering service.
///
/// Mirrors the client-trait seam used for language-model policies: the
/// engine owns prompt construction and answer classification, the
/// implementation owns the wire protocol.
#[async_trait]
pub trait VisualOracle: Send + Sync {
    /// Answer `questions` about the referenced images with free text.
    async fn ask(&self, images: &[String], questions: &[String]) -> Result<String, OracleError>;
}

/// Bounded-retry schedule for oracle calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(attempt)
    }
}

/// Retrying facade the orchestrator hands to photograph rules. A failed call
/// is retried with exponential backoff; once attempts are exhausted the last
/// error is surfaced as [`OracleError::Exhausted`].
pub struct RetryingOracle<'a> {
    inner: &'a dyn VisualOracle,
    policy: RetryPolicy,
}

impl<'a> RetryingOracle<'a> {
    pub fn new(inner: &'a dyn VisualOracle, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub async fn ask(
        &self,
        images: &[String],
        questions: &[String],
    ) -> Result<String, OracleError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            match self.inner.ask(images, questions).await {
                Ok(answer) => return Ok(answer),
                Err(err) => {
                    last_error = err.to_string();
                    tracing::warn!(attempt, error = %last_error, "oracle call failed");
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.policy.backoff_for(attempt)).await;
                    }
                }
            }
        }

        Err(OracleError::Exhausted {
            attempts,
            last: last_error,
        })
    }
}

/// Classification of an oracle answer. Anything that is not a case-insensitive
/// "true"/"false" is unexpected and degrades the asking rule to a Warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleAnswer {
    Affirmative,
    Negative,
    Unexpected(String),
}

pub fn classify_answer(raw: &str) -> OracleAnswer {
    match raw.trim().to_lowercase().as_str() {
        "true" => OracleAnswer::Affirmative,
        "false" => OracleAnswer::Negative,
        other => OracleAnswer::Unexpected(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyOracle {
        calls: AtomicU32,
        succeed_on: u32,
    }

    #[async_trait]
    impl VisualOracle for FlakyOracle {
        async fn ask(&self, _: &[String], _: &[String]) -> Result<String, OracleError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.succeed_on {
                Ok("True".to_string())
            } else {
                Err(OracleError::Transport("connection reset".to_string()))
            }
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let oracle = FlakyOracle {
            calls: AtomicU32::new(0),
            succeed_on: 3,
        };
        let retrying = RetryingOracle::new(&oracle, policy());
        let answer = retrying.ask(&[], &[]).await.expect("third attempt succeeds");
        assert_eq!(classify_answer(&answer), OracleAnswer::Affirmative);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_reports_attempt_count() {
        let oracle = FlakyOracle {
            calls: AtomicU32::new(0),
            succeed_on: 10,
        };
        let retrying = RetryingOracle::new(&oracle, policy());
        let err = retrying.ask(&[], &[]).await.expect_err("never succeeds");
        assert!(matches!(err, OracleError::Exhausted { attempts: 3, .. }));
    }

    #[test]
    fn answers_classify_case_insensitively() {
        assert_eq!(classify_answer(" TRUE "), OracleAnswer::Affirmative);
        assert_eq!(classify_answer("False"), OracleAnswer::Negative);
        assert_eq!(
            classify_answer("probably"),
            OracleAnswer::Unexpected("probably".to_string())
        );
    }
}
