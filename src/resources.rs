//! MCP resource reads.
//!
//! Resources take no arguments: each URI maps to one client call with every
//! optional parameter left at its default (system scope, default data
//! collection). Failures are reported inside the content block; the resource
//! calling convention has no `isError` flag.

use serde_json::{json, Value};

use crate::catalog::{ResourceUri, MIME_JSON};
use crate::client::FroniusClient;
use crate::error::FroniusError;
use crate::outcome::RequestOutcome;

/// Contents of a `resources/read` response.
#[derive(Debug)]
pub struct ResourceResult {
    pub contents: Vec<Value>,
}

impl ResourceResult {
    fn text(uri: &str, value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_default();
        Self {
            contents: vec![json!({ "uri": uri, "mimeType": MIME_JSON, "text": text })],
        }
    }

    /// The JSON payload carried in the first content block.
    pub fn payload(&self) -> Value {
        self.contents
            .first()
            .and_then(|c| c["text"].as_str())
            .and_then(|t| serde_json::from_str(t).ok())
            .unwrap_or(Value::Null)
    }
}

async fn fetch(resource: ResourceUri, client: &FroniusClient) -> Result<Value, FroniusError> {
    match resource {
        ResourceUri::ApiVersion => Ok(client.api_version().await?.into_value()),
        ResourceUri::SystemStatus => client.system_status().await,
        ResourceUri::SystemLed => client.logger_led_info().await,
        ResourceUri::InverterInfo => client.inverter_info(None).await,
        ResourceUri::InverterRealtime => client.inverter_realtime(None, None).await,
        ResourceUri::MeterRealtime => client.meter_realtime(None).await,
        ResourceUri::PowerFlowRealtime => client.power_flow_realtime().await,
        ResourceUri::SensorsRealtime => client.sensor_realtime(None).await,
        ResourceUri::StringsRealtime => client.string_realtime(None).await,
        ResourceUri::StorageRealtime => client.storage_realtime(None).await,
        ResourceUri::OhmPilotRealtime => client.ohmpilot_realtime(None).await,
        ResourceUri::DevicesActive => client.active_devices(None).await,
    }
}

/// Read a resource by URI.
pub async fn read_resource(uri: &str, client: &FroniusClient) -> ResourceResult {
    let result = match ResourceUri::parse(uri) {
        Some(resource) => fetch(resource, client).await,
        None => Err(FroniusError::UnknownCapability(uri.to_string())),
    };
    match RequestOutcome::capture(uri, result) {
        RequestOutcome::Success(data) => ResourceResult::text(uri, &data),
        RequestOutcome::Failure {
            message, timestamp, ..
        } => ResourceResult::text(
            uri,
            &json!({ "error": message, "timestamp": timestamp, "uri": uri }),
        ),
    }
}
