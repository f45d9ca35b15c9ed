//! Timeout and retry wrapper around collaborator calls

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};
use tunesense_core::AnalysisError;

/// Limits applied to every outbound call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallPolicy {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 2,
            backoff_base_ms: 250,
        }
    }
}

/// Runs collaborator calls under a timeout, retrying transient failures
/// with exponential backoff.
#[derive(Debug, Clone)]
pub struct CallGuard {
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
}

impl Default for CallGuard {
    fn default() -> Self {
        Self::new(&CallPolicy::default())
    }
}

impl CallGuard {
    pub fn new(policy: &CallPolicy) -> Self {
        Self {
            timeout: Duration::from_secs(policy.timeout_secs),
            max_retries: policy.max_retries,
            backoff_base: Duration::from_millis(policy.backoff_base_ms),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff_base = backoff_base;
        self
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * (1u32 << attempt.saturating_sub(1).min(5))
    }

    /// Call `op` once, bounded by the configured timeout.
    pub async fn once<T, Fut>(&self, collaborator: &'static str, op: Fut) -> Result<T, AnalysisError>
    where
        Fut: Future<Output = Result<T, AnalysisError>>,
    {
        timeout(self.timeout, op)
            .await
            .map_err(|_| AnalysisError::Timeout {
                collaborator,
                secs: self.timeout.as_secs(),
            })?
    }

    /// Call `op` until it succeeds, fails permanently, or retries run out.
    pub async fn call<T, F, Fut>(&self, collaborator: &'static str, mut op: F) -> Result<T, AnalysisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AnalysisError>>,
    {
        let mut attempt = 0;
        loop {
            match self.once(collaborator, op()).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{} call succeeded on attempt {}", collaborator, attempt + 1);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    warn!("{} call failed ({}), retry {} after {:?}", collaborator, e, attempt, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
