//! Waiting for a submitted task to finish.

use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::client::TaskApi;
use crate::error::WorkflowError;
use crate::model::{AnnotationResult, StatusPayload, TaskHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two in-progress answers.
    pub interval: Duration,
    /// Ceiling on the whole polling phase.
    pub timeout: Duration,
    /// Failed requests in a row before the batch is abandoned.
    pub max_consecutive_failures: u32,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(120),
            max_consecutive_failures: 5,
            backoff_initial: Duration::from_millis(500),
            backoff_max: Duration::from_secs(8),
        }
    }
}

impl PollPolicy {
    /// Wait after the `failures`-th consecutive failure (1-based).
    pub fn backoff(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(16);
        self.backoff_initial
            .saturating_mul(1u32 << exp)
            .min(self.backoff_max)
    }
}

/// Poll `handle` until the backend answers with a completed collection.
///
/// The first request goes out immediately. `on_attempt` sees the 1-based number of
/// every request before it is sent. Nothing is polled after the first completed
/// answer, after cancellation, or once `policy.timeout` has passed.
pub async fn poll_until_complete<A, F>(
    api: &A,
    handle: &TaskHandle,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut on_attempt: F,
) -> Result<Vec<AnnotationResult>, WorkflowError>
where
    A: TaskApi + ?Sized,
    F: FnMut(u32),
{
    let deadline = Instant::now() + policy.timeout;
    let mut attempts = 0u32;
    let mut failures = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(WorkflowError::Cancelled);
        }
        attempts += 1;
        on_attempt(attempts);

        let answer = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
            _ = sleep_until(deadline) => return Err(WorkflowError::PollTimeout(policy.timeout)),
            answer = api.status(handle) => answer,
        };

        let wait = match answer {
            Ok(StatusPayload::Completed(results)) => {
                tracing::info!(
                    "{handle} completed after {attempts} poll(s) with {} result(s)",
                    results.len()
                );
                return Ok(results);
            }
            Ok(StatusPayload::InProgress(_)) => {
                failures = 0;
                tracing::debug!("{handle} still in progress (poll {attempts})");
                policy.interval
            }
            Err(err) => {
                failures += 1;
                if failures >= policy.max_consecutive_failures {
                    tracing::warn!("giving up on {handle}: {err}");
                    return Err(WorkflowError::PollFailed {
                        attempts: failures,
                        last: err.to_string(),
                    });
                }
                let backoff = policy.backoff(failures);
                tracing::warn!("poll {attempts} of {handle} failed ({err}), retrying in {backoff:?}");
                backoff
            }
        };

        if Instant::now() + wait >= deadline {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
                _ = sleep_until(deadline) => {}
            }
            tracing::warn!("{handle} not finished within {:?}", policy.timeout);
            return Err(WorkflowError::PollTimeout(policy.timeout));
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
            _ = sleep(wait) => {}
        }
    }
}
