//! MCP tool handlers.
//!
//! A `tools/call` request goes through three steps:
//!
//! 1. the name is resolved to a [`ToolName`] (unknown names fail with
//!    [`FroniusError::UnknownCapability`]);
//! 2. the loosely-typed JSON arguments are converted into a typed
//!    [`ToolCall`], with defaults taken from the tool's catalog schema;
//! 3. the call is executed against the [`FroniusClient`].
//!
//! Every failure is turned into an `isError` result carrying the tool name
//! and the arguments that were supplied. Nothing propagates past
//! [`handle_tool_call`].

use serde_json::{json, Map, Value};

use crate::catalog::{ParamSpec, ToolDescriptor, ToolName};
use crate::client::{ArchiveQuery, FroniusClient};
use crate::endpoints::Scope;
use crate::error::FroniusError;
use crate::outcome::{timestamp, RequestOutcome};

/// A tool invocation with validated, defaulted arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    ApiVersion,
    SystemStatus,
    LoggerLedInfo,
    InverterInfo {
        device_id: Option<u32>,
    },
    InverterRealtime {
        device_id: Option<u32>,
        data_collection: String,
    },
    MeterRealtime {
        scope: Scope,
    },
    PowerFlowRealtime,
    ArchiveData(ArchiveQuery),
    SensorRealtime {
        data_collection: String,
    },
    StringRealtime {
        data_collection: String,
    },
    StorageRealtime {
        device_id: Option<u32>,
    },
    OhmPilotRealtime {
        device_id: Option<u32>,
    },
    ActiveDevices {
        device_class: String,
    },
    TestConnection,
}

impl ToolCall {
    /// Validate `args` against the tool's schema and build the typed call.
    pub fn parse(tool: ToolName, args: &Value) -> Result<Self, FroniusError> {
        let args = Args::new(tool.descriptor(), args)?;
        let call = match tool {
            ToolName::GetApiVersion => ToolCall::ApiVersion,
            ToolName::GetSystemStatus => ToolCall::SystemStatus,
            ToolName::GetLoggerLedInfo => ToolCall::LoggerLedInfo,
            ToolName::GetInverterInfo => ToolCall::InverterInfo {
                device_id: args.device_id("deviceId")?,
            },
            ToolName::GetInverterRealtime => ToolCall::InverterRealtime {
                device_id: args.device_id("deviceId")?,
                data_collection: args.required_string("dataCollection")?,
            },
            ToolName::GetMeterRealtime => ToolCall::MeterRealtime {
                scope: args.scope("scope")?,
            },
            ToolName::GetPowerflowRealtime => ToolCall::PowerFlowRealtime,
            ToolName::GetArchiveData => ToolCall::ArchiveData(ArchiveQuery {
                start_date: Some(args.required_string("startDate")?),
                end_date: Some(args.required_string("endDate")?),
                channel: args.string("channel")?,
                scope: Some(args.scope("scope")?),
                device_id: args.device_id("deviceId")?,
            }),
            ToolName::GetSensorRealtime => ToolCall::SensorRealtime {
                data_collection: args.required_string("dataCollection")?,
            },
            ToolName::GetStringRealtime => ToolCall::StringRealtime {
                data_collection: args.required_string("dataCollection")?,
            },
            ToolName::GetStorageRealtime => ToolCall::StorageRealtime {
                device_id: args.device_id("deviceId")?,
            },
            ToolName::GetOhmpilotRealtime => ToolCall::OhmPilotRealtime {
                device_id: args.device_id("deviceId")?,
            },
            ToolName::GetActiveDevices => ToolCall::ActiveDevices {
                device_class: args.required_string("deviceClass")?,
            },
            ToolName::TestConnection => ToolCall::TestConnection,
        };
        Ok(call)
    }

    /// Run the call and return `(confirmation message, data)`.
    async fn execute(self, client: &FroniusClient) -> Result<(&'static str, Value), FroniusError> {
        let result = match self {
            ToolCall::ApiVersion => (
                "API version information retrieved successfully",
                client.api_version().await?.into_value(),
            ),
            ToolCall::SystemStatus => (
                "System status retrieved successfully",
                client.system_status().await?,
            ),
            ToolCall::LoggerLedInfo => (
                "Logger LED information retrieved successfully",
                client.logger_led_info().await?,
            ),
            ToolCall::InverterInfo { device_id } => (
                "Inverter information retrieved successfully",
                client.inverter_info(device_id).await?,
            ),
            ToolCall::InverterRealtime {
                device_id,
                data_collection,
            } => (
                "Inverter realtime data retrieved successfully",
                client
                    .inverter_realtime(device_id, Some(&data_collection))
                    .await?,
            ),
            ToolCall::MeterRealtime { scope } => (
                "Smart meter realtime data retrieved successfully",
                client.meter_realtime(Some(scope)).await?,
            ),
            ToolCall::PowerFlowRealtime => (
                "Power flow realtime data retrieved successfully",
                client.power_flow_realtime().await?,
            ),
            ToolCall::ArchiveData(query) => (
                "Archive data retrieved successfully",
                client.archive_data(&query).await?,
            ),
            ToolCall::SensorRealtime { data_collection } => (
                "Sensor realtime data retrieved successfully",
                client.sensor_realtime(Some(&data_collection)).await?,
            ),
            ToolCall::StringRealtime { data_collection } => (
                "String realtime data retrieved successfully",
                client.string_realtime(Some(&data_collection)).await?,
            ),
            ToolCall::StorageRealtime { device_id } => (
                "Storage real-time data retrieved successfully",
                client.storage_realtime(device_id).await?,
            ),
            ToolCall::OhmPilotRealtime { device_id } => (
                "OhmPilot real-time data retrieved successfully",
                client.ohmpilot_realtime(device_id).await?,
            ),
            ToolCall::ActiveDevices { device_class } => (
                "Active devices information retrieved successfully",
                client.active_devices(Some(&device_class)).await?,
            ),
            ToolCall::TestConnection => {
                let connected = client.test_connection().await;
                let message = if connected {
                    "Connection test successful"
                } else {
                    "Connection test failed"
                };
                let data = json!({
                    "connected": connected,
                    "config": client.config(),
                    "timestamp": timestamp(),
                });
                (message, data)
            }
        };
        Ok(result)
    }
}

/// Tool arguments bound to the tool's parameter schema.
struct Args<'a> {
    descriptor: &'static ToolDescriptor,
    values: Option<&'a Map<String, Value>>,
}

impl<'a> Args<'a> {
    fn new(descriptor: &'static ToolDescriptor, args: &'a Value) -> Result<Self, FroniusError> {
        let values = match args {
            Value::Null => None,
            Value::Object(map) => Some(map),
            _ => {
                return Err(FroniusError::Input(
                    "arguments must be a JSON object".into(),
                ))
            }
        };
        Ok(Self { descriptor, values })
    }

    fn spec(&self, name: &str) -> Result<&'static ParamSpec, FroniusError> {
        self.descriptor.param(name).ok_or_else(|| {
            FroniusError::Input(format!(
                "{} has no parameter {name}",
                self.descriptor.tool.as_str()
            ))
        })
    }

    /// Raw value; `null` and `""` count as omitted.
    fn raw(&self, name: &str) -> Option<&'a Value> {
        self.values
            .and_then(|m| m.get(name))
            .filter(|v| !v.is_null() && v.as_str() != Some(""))
    }

    /// String parameter, falling back to the schema default.
    fn string(&self, name: &str) -> Result<Option<String>, FroniusError> {
        let spec = self.spec(name)?;
        let value = match self.raw(name) {
            None => return Ok(spec.default.map(str::to_string)),
            Some(v) => v.as_str().ok_or_else(|| {
                FroniusError::Input(format!("Parameter {name} must be a string"))
            })?,
        };
        if !spec.allowed.is_empty() && !spec.allowed.contains(&value) {
            return Err(FroniusError::Input(format!(
                "Invalid value '{value}' for {name} (expected one of: {})",
                spec.allowed.join(", ")
            )));
        }
        Ok(Some(value.to_string()))
    }

    /// String parameter that must end up with a value, supplied or defaulted.
    fn required_string(&self, name: &str) -> Result<String, FroniusError> {
        self.string(name)?
            .ok_or_else(|| FroniusError::Input(format!("Missing required parameter: {name}")))
    }

    fn scope(&self, name: &str) -> Result<Scope, FroniusError> {
        self.required_string(name)?
            .parse()
            .map_err(FroniusError::Input)
    }

    /// Device id; `0` is treated as "not supplied".
    fn device_id(&self, name: &str) -> Result<Option<u32>, FroniusError> {
        self.spec(name)?;
        let Some(value) = self.raw(name) else {
            return Ok(None);
        };
        let id = value
            .as_u64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                FroniusError::Input(format!(
                    "Parameter {name} must be a non-negative integer (got {value})"
                ))
            })?;
        Ok(Some(id).filter(|id| *id != 0))
    }
}

/// Result of an MCP tool call, ready to be serialized into a JSON-RPC response.
#[derive(Debug)]
pub struct ToolResult {
    /// MCP content blocks (a single `{"type":"text","text":"..."}` entry).
    pub content: Vec<Value>,
    /// Whether the tool call failed (maps to `isError` in the MCP response).
    pub is_error: bool,
}

impl ToolResult {
    fn text(value: &Value, is_error: bool) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_default();
        Self {
            content: vec![json!({ "type": "text", "text": text })],
            is_error,
        }
    }

    /// The JSON payload carried in the first text block.
    pub fn payload(&self) -> Value {
        self.content
            .first()
            .and_then(|c| c["text"].as_str())
            .and_then(|t| serde_json::from_str(t).ok())
            .unwrap_or(Value::Null)
    }
}

/// Handle a tool call and return MCP content.
pub async fn handle_tool_call(name: &str, args: &Value, client: &FroniusClient) -> ToolResult {
    let result = match ToolName::parse(name) {
        Some(tool) => match ToolCall::parse(tool, args) {
            Ok(call) => call.execute(client).await,
            Err(e) => Err(e),
        },
        None => Err(FroniusError::UnknownCapability(name.to_string())),
    };

    let (message, result) = match result {
        Ok((message, data)) => (Some(message), Ok(data)),
        Err(e) => (None, Err(e)),
    };
    match RequestOutcome::capture(name, result) {
        RequestOutcome::Success(data) => {
            ToolResult::text(&json!({ "message": message, "data": data }), false)
        }
        RequestOutcome::Failure {
            message,
            timestamp,
            origin,
        } => ToolResult::text(
            &json!({
                "error": format!("Error executing {origin}: {message}"),
                "timestamp": timestamp,
                "tool": origin,
                "arguments": args,
            }),
            true,
        ),
    }
}
