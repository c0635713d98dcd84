//! Wire types of the Fronius Solar API.
//!
//! Most endpoints wrap their payload in an [`Envelope`]. `GetAPIVersion.cgi`
//! is the exception: it returns a bare [`ApiVersion`] object.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Standard response wrapper: `{ "Body": ..., "Head": { "Status": ... } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Absent on some error replies.
    #[serde(rename = "Body", default)]
    pub body: Option<T>,
    #[serde(rename = "Head")]
    pub head: Head,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Head {
    #[serde(rename = "Status")]
    pub status: Status,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "RequestArguments", default)]
    pub request_arguments: Map<String, Value>,
}

/// `Code` 0 means success; anything else is a device-level error.
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    #[serde(rename = "Code")]
    pub code: i64,
    #[serde(rename = "Reason", default)]
    pub reason: String,
    #[serde(rename = "UserMessage", default)]
    pub user_message: String,
}

/// Bare response of `GetAPIVersion.cgi`, kept exactly as the device sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiVersion(pub Value);

impl ApiVersion {
    /// `APIVersion` field: a string on some firmware generations, a number on others.
    pub fn version(&self) -> Option<&Value> {
        self.0.get("APIVersion")
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}
