//! Fixed-delay retry loop for device requests.
//!
//! Only [`FroniusError::is_retryable`] failures (timeouts, DNS failures,
//! refused connections) are retried. Device-reported errors are
//! deterministic and returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::FroniusError;
use crate::transport::Sleeper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    pub delay: Duration,
}

/// Run `op` until it succeeds, fails terminally, or `policy.retries` extra
/// attempts have been spent. `op` receives the zero-based attempt number.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, FroniusError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FroniusError>>,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.retries => {
                warn!(
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
                    "request failed: {e}, retrying"
                );
                sleeper.sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
