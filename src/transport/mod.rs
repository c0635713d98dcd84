//! HTTP transport seam between [`FroniusClient`](crate::client::FroniusClient)
//! and the network.
//!
//! - [`http::ReqwestTransport`]: the real implementation.
//! - [`fake::FakeTransport`]: scripted responses for unit tests (cfg(test) only).
//!
//! A transport performs exactly one GET per call and knows nothing about
//! envelopes or retries. The [`Sleeper`] trait lets the retry loop wait
//! without tying tests to wall-clock time.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

pub mod http;

#[cfg(test)]
pub mod fake;

pub use http::ReqwestTransport;

/// One GET request against the device.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetch `url` and return the response body of a 2xx reply.
    ///
    /// The call must give up with [`TransportError::Timeout`] once `timeout`
    /// has elapsed. Non-2xx replies map to [`TransportError::Status`].
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, TransportError>;
}

/// Waits between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
