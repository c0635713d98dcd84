//! Scripted in-process transport for unit tests.
//!
//! Responses are queued with [`FakeTransport::push`] and consumed one per
//! `get` call, in order. Every requested URL is recorded so tests can assert
//! on exact query strings and on the number of attempts made. When the
//! queue runs dry, `get` fails with a non-retryable error.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{HttpTransport, Sleeper};
use crate::error::TransportError;

#[derive(Default, Clone)]
pub struct FakeTransport {
    responses: Arc<Mutex<VecDeque<Result<String, TransportError>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<String, TransportError>) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn push_json(&self, body: Value) -> &Self {
        self.push(Ok(body.to_string()))
    }

    /// Queue a successful envelope around `body`.
    pub fn push_envelope(&self, body: Value) -> &Self {
        self.push_json(envelope(0, "", body))
    }

    /// Queue an envelope whose status reports a device error.
    pub fn push_device_error(&self, code: i64, reason: &str) -> &Self {
        self.push_json(envelope(code, reason, Value::Object(Default::default())))
    }

    pub fn push_timeout(&self) -> &Self {
        self.push(Err(TransportError::Timeout(10_000)))
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<String> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<String, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".into())))
    }
}

/// Records requested delays instead of sleeping.
#[derive(Default, Clone)]
pub struct RecordingSleeper {
    pub delays: Arc<Mutex<Vec<Duration>>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

pub fn envelope(code: i64, reason: &str, body: Value) -> Value {
    serde_json::json!({
        "Body": body,
        "Head": {
            "RequestArguments": {},
            "Status": { "Code": code, "Reason": reason, "UserMessage": "" },
            "Timestamp": "2024-05-01T12:00:00+02:00"
        }
    })
}
