// starlift-core/src/application/retry.rs

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::StarliftError;

/// Bounded retry with a fixed inter-attempt delay, applied per task by the
/// graph.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// No re-attempts, no waiting. Handy in tests and ad-hoc runs.
    pub fn none() -> Self {
        Self {
            retries: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Drive one task attempt function under the policy.
///
/// Non-retryable errors (misconfiguration, unresolved templates) fail fast:
/// retrying cannot conjure up a missing parameter.
pub async fn run_with_retry<F, Fut>(
    policy: &RetryPolicy,
    task_id: &str,
    mut attempt_fn: F,
) -> Result<(), StarliftError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), StarliftError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match attempt_fn().await {
            Ok(()) => return Ok(()),
            Err(e) if !e.is_retryable() => {
                error!(task = task_id, error = %e, "Task failed with terminal error");
                return Err(e);
            }
            Err(e) if attempt > policy.retries => {
                error!(task = task_id, attempts = attempt, error = %e, "Retry budget exhausted");
                return Err(e);
            }
            Err(e) => {
                warn!(
                    task = task_id,
                    attempt,
                    delay = ?policy.delay,
                    error = %e,
                    "Task failed, will retry"
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
