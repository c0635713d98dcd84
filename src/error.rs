//! Error types shared by the device client and the dispatcher.
//!
//! Failures fall into three families:
//!
//! - [`TransportError`]: the HTTP exchange itself failed (timeout, DNS,
//!   refused connection, non-2xx status, unparsable body). Timeouts and
//!   connection failures are retried by [`crate::retry`].
//! - [`FroniusError::Device`]: the device answered, but its envelope carries
//!   a non-zero `Head.Status.Code`. Never retried.
//! - [`FroniusError::Input`] / [`FroniusError::UnknownCapability`]: the
//!   caller asked for something invalid. Detected before any network call.

use thiserror::Error;

/// Failure of a single HTTP exchange with the device.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within the configured timeout and was aborted.
    #[error("request timed out after {0}ms")]
    Timeout(u64),
    /// Host not found or connection refused.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The device answered with a non-2xx HTTP status.
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    /// The response body was not the JSON we expected.
    #[error("invalid JSON from device: {0}")]
    Decode(String),
    /// The configured host/port do not form a valid URL.
    #[error("invalid device URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Timeouts and connection-level failures are transient; everything else
    /// will fail the same way on the next attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Timeout(_) | TransportError::Connect(_))
    }
}

/// Errors returned by [`FroniusClient`](crate::client::FroniusClient) methods
/// and by argument conversion in the dispatcher.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FroniusError {
    #[error("Fronius API request failed: {0}")]
    Transport(#[from] TransportError),
    /// The device reported a business-level error in its response envelope.
    #[error("Fronius API error {code}: {reason} - {user_message}")]
    Device {
        code: i64,
        reason: String,
        user_message: String,
    },
    #[error("{0}")]
    Input(String),
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),
}

impl FroniusError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FroniusError::Transport(e) if e.is_retryable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_connect_are_retryable() {
        assert!(FroniusError::from(TransportError::Timeout(1000)).is_retryable());
        assert!(FroniusError::from(TransportError::Connect("refused".into())).is_retryable());
    }

    #[test]
    fn status_decode_and_device_errors_are_terminal() {
        let status = TransportError::Status {
            status: 500,
            reason: "Internal Server Error".into(),
        };
        assert!(!FroniusError::from(status).is_retryable());
        assert!(!FroniusError::from(TransportError::Decode("eof".into())).is_retryable());
        let device = FroniusError::Device {
            code: 255,
            reason: "Query not supported".into(),
            user_message: String::new(),
        };
        assert!(!device.is_retryable());
        assert!(!FroniusError::Input("missing".into()).is_retryable());
    }

    #[test]
    fn device_error_message_carries_code_reason_and_user_message() {
        let e = FroniusError::Device {
            code: 8,
            reason: "Invalid date range".into(),
            user_message: "Range too long".into(),
        };
        assert_eq!(
            e.to_string(),
            "Fronius API error 8: Invalid date range - Range too long"
        );
    }
}
