//! Per-request result carried from the dispatcher to the protocol layer.
//!
//! A [`RequestOutcome`] is never an `Err`: every failure is captured with
//! its message, a timestamp and the name of the capability that produced it,
//! then serialized into the response payload.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::error;

use crate::error::FroniusError;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Success(Value),
    Failure {
        message: String,
        timestamp: String,
        origin: String,
    },
}

impl RequestOutcome {
    /// Convert a client result, logging failures.
    pub fn capture(origin: &str, result: Result<Value, FroniusError>) -> Self {
        match result {
            Ok(value) => RequestOutcome::Success(value),
            Err(e) => {
                error!("{origin} failed: {e}");
                RequestOutcome::Failure {
                    message: e.to_string(),
                    timestamp: timestamp(),
                    origin: origin.to_string(),
                }
            }
        }
    }
}

/// Current time as ISO-8601 UTC with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
