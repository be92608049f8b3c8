//! Polling of the provider's long-running send operation.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

use super::payload::OperationStatus;
use super::MailError;

#[derive(Debug, Clone, Copy)]
pub(crate) struct PollOptions {
    /// Wait between polls when the provider sends no `Retry-After`.
    pub interval: Duration,
    /// Upper bound on the whole wait.
    pub timeout: Duration,
}

/// One observation of the operation.
#[derive(Debug, Clone)]
pub(crate) struct Poll {
    pub status: OperationStatus,
    pub retry_after: Option<Duration>,
}

/// `Retry-After` in delta-seconds form.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Call `fetch` until the operation reaches a terminal state.
pub(crate) async fn poll_until_done<F, Fut>(
    initial: Poll,
    options: PollOptions,
    mut fetch: F,
) -> Result<OperationStatus, MailError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Poll, MailError>>,
{
    let id = initial.status.id.clone();

    let wait = async move {
        let mut current = initial;
        while !current.status.status.is_terminal() {
            let delay = current.retry_after.unwrap_or(options.interval);
            tracing::debug!(
                id = %current.status.id,
                status = %current.status.status,
                ?delay,
                "email operation pending"
            );
            tokio::time::sleep(delay).await;
            current = fetch().await?;
        }
        Ok(current.status)
    };

    tokio::time::timeout(options.timeout, wait)
        .await
        .map_err(|_| MailError::Timeout { id })?
}
