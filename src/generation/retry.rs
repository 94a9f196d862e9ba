// src/generation/retry.rs

use std::time::Duration;

use crate::{
    config::Config,
    generation::invoker::{InvokeError, ModelInvoker},
};

/// How hard to push through transient model overloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// The wait before attempt `n + 1` is `n * backoff_unit`.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.llm_max_attempts,
            backoff_unit: Duration::from_secs(config.llm_backoff_secs),
        }
    }

    /// Linear backoff after the given (1-based) failed attempt.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }
}

/// Calls the model, retrying transient failures with linear backoff.
///
/// Non-transient errors return immediately. After `max_attempts` transient
/// failures the last error is returned.
pub async fn invoke_with_retry(
    invoker: &dyn ModelInvoker,
    prompt: &str,
    policy: &RetryPolicy,
) -> Result<String, InvokeError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match invoker.generate(prompt).await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let wait = policy.backoff_after(attempt);
                tracing::warn!(
                    "Model overloaded, retrying in {:?}... (Attempt {}/{}): {}",
                    wait,
                    attempt,
                    max_attempts,
                    e
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::error!("Model still overloaded after {} attempts: {}", attempt, e);
                } else {
                    tracing::error!("Model call failed: {}", e);
                }
                return Err(e);
            }
        }
    }
}
