//! Static catalog of MCP resources and tools.
//!
//! Capability names are closed enums ([`ResourceUri`], [`ToolName`]); the
//! descriptor tables below are the single place where parameter schemas and
//! their defaults are declared. [`ToolDescriptor::input_schema`] renders a
//! descriptor as the JSON Schema returned by `tools/list`, and the
//! dispatcher reads defaults from the same [`ParamSpec`]s.

use serde_json::{json, Map, Value};

use crate::endpoints::defaults;

pub const URI_SCHEME: &str = "fronius://";
pub const MIME_JSON: &str = "application/json";

/// A readable resource, addressed as `fronius://<category>/<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceUri {
    ApiVersion,
    SystemStatus,
    SystemLed,
    InverterInfo,
    InverterRealtime,
    MeterRealtime,
    PowerFlowRealtime,
    SensorsRealtime,
    StringsRealtime,
    StorageRealtime,
    OhmPilotRealtime,
    DevicesActive,
}

impl ResourceUri {
    /// `(category, name)` path segments after the scheme.
    fn segments(self) -> (&'static str, &'static str) {
        match self {
            ResourceUri::ApiVersion => ("api", "version"),
            ResourceUri::SystemStatus => ("system", "status"),
            ResourceUri::SystemLed => ("system", "led"),
            ResourceUri::InverterInfo => ("inverter", "info"),
            ResourceUri::InverterRealtime => ("inverter", "realtime"),
            ResourceUri::MeterRealtime => ("meter", "realtime"),
            ResourceUri::PowerFlowRealtime => ("powerflow", "realtime"),
            ResourceUri::SensorsRealtime => ("sensors", "realtime"),
            ResourceUri::StringsRealtime => ("strings", "realtime"),
            ResourceUri::StorageRealtime => ("storage", "realtime"),
            ResourceUri::OhmPilotRealtime => ("ohmpilot", "realtime"),
            ResourceUri::DevicesActive => ("devices", "active"),
        }
    }

    pub fn uri(self) -> String {
        let (category, name) = self.segments();
        format!("{URI_SCHEME}{category}/{name}")
    }

    /// Parse `fronius://<category>/<name>`; `None` for anything not in the catalog.
    pub fn parse(uri: &str) -> Option<Self> {
        let (category, name) = uri.strip_prefix(URI_SCHEME)?.split_once('/')?;
        RESOURCES
            .iter()
            .map(|r| r.resource)
            .find(|r| r.segments() == (category, name))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceDescriptor {
    pub resource: ResourceUri,
    pub name: &'static str,
    pub description: &'static str,
}

impl ResourceDescriptor {
    pub fn to_json(&self) -> Value {
        json!({
            "uri": self.resource.uri(),
            "mimeType": MIME_JSON,
            "name": self.name,
            "description": self.description,
        })
    }
}

pub const RESOURCES: &[ResourceDescriptor] = &[
    ResourceDescriptor {
        resource: ResourceUri::ApiVersion,
        name: "API Version",
        description: "Fronius Solar API version information",
    },
    ResourceDescriptor {
        resource: ResourceUri::SystemStatus,
        name: "System Status",
        description: "Logger and system information",
    },
    ResourceDescriptor {
        resource: ResourceUri::SystemLed,
        name: "LED Status",
        description: "Logger LED status information",
    },
    ResourceDescriptor {
        resource: ResourceUri::InverterInfo,
        name: "Inverter Information",
        description: "Static inverter information",
    },
    ResourceDescriptor {
        resource: ResourceUri::InverterRealtime,
        name: "Inverter Realtime Data",
        description: "Current inverter measurements and status",
    },
    ResourceDescriptor {
        resource: ResourceUri::MeterRealtime,
        name: "Smart Meter Realtime Data",
        description: "Current smart meter measurements",
    },
    ResourceDescriptor {
        resource: ResourceUri::PowerFlowRealtime,
        name: "Power Flow Realtime Data",
        description: "Energy flow data showing production, consumption, and grid interaction",
    },
    ResourceDescriptor {
        resource: ResourceUri::SensorsRealtime,
        name: "Sensor Realtime Data",
        description: "Environmental sensor data (temperature, irradiance, etc.)",
    },
    ResourceDescriptor {
        resource: ResourceUri::StringsRealtime,
        name: "String Realtime Data",
        description: "DC string voltage and current measurements",
    },
    ResourceDescriptor {
        resource: ResourceUri::StorageRealtime,
        name: "Storage Realtime Data",
        description: "Battery storage system data including state of charge, power, and temperature",
    },
    ResourceDescriptor {
        resource: ResourceUri::OhmPilotRealtime,
        name: "OhmPilot Realtime Data",
        description: "Smart heating element controller data including power consumption and temperature",
    },
    ResourceDescriptor {
        resource: ResourceUri::DevicesActive,
        name: "Active Devices",
        description: "List of active devices in the system",
    },
];

/// A callable tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    GetApiVersion,
    GetSystemStatus,
    GetLoggerLedInfo,
    GetInverterInfo,
    GetInverterRealtime,
    GetMeterRealtime,
    GetPowerflowRealtime,
    GetArchiveData,
    GetSensorRealtime,
    GetStringRealtime,
    GetStorageRealtime,
    GetOhmpilotRealtime,
    GetActiveDevices,
    TestConnection,
}

impl ToolName {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::GetApiVersion => "get_api_version",
            ToolName::GetSystemStatus => "get_system_status",
            ToolName::GetLoggerLedInfo => "get_logger_led_info",
            ToolName::GetInverterInfo => "get_inverter_info",
            ToolName::GetInverterRealtime => "get_inverter_realtime",
            ToolName::GetMeterRealtime => "get_meter_realtime",
            ToolName::GetPowerflowRealtime => "get_powerflow_realtime",
            ToolName::GetArchiveData => "get_archive_data",
            ToolName::GetSensorRealtime => "get_sensor_realtime",
            ToolName::GetStringRealtime => "get_string_realtime",
            ToolName::GetStorageRealtime => "get_storage_realtime",
            ToolName::GetOhmpilotRealtime => "get_ohmpilot_realtime",
            ToolName::GetActiveDevices => "get_active_devices",
            ToolName::TestConnection => "test_connection",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        TOOLS.iter().map(|t| t.tool).find(|t| t.as_str() == name)
    }

    /// Position of this tool in [`TOOLS`].
    const fn index(self) -> usize {
        match self {
            ToolName::GetApiVersion => 0,
            ToolName::GetSystemStatus => 1,
            ToolName::GetLoggerLedInfo => 2,
            ToolName::GetInverterInfo => 3,
            ToolName::GetInverterRealtime => 4,
            ToolName::GetMeterRealtime => 5,
            ToolName::GetPowerflowRealtime => 6,
            ToolName::GetArchiveData => 7,
            ToolName::GetSensorRealtime => 8,
            ToolName::GetStringRealtime => 9,
            ToolName::GetStorageRealtime => 10,
            ToolName::GetOhmpilotRealtime => 11,
            ToolName::GetActiveDevices => 12,
            ToolName::TestConnection => 13,
        }
    }

    /// The catalog entry for this tool.
    pub fn descriptor(self) -> &'static ToolDescriptor {
        &TOOLS[self.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
}

/// Schema of one tool parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    /// Allowed values; empty means unrestricted.
    pub allowed: &'static [&'static str],
    pub default: Option<&'static str>,
    pub required: bool,
    pub minimum: Option<i64>,
    pub pattern: Option<&'static str>,
}

impl ParamSpec {
    const fn string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::String,
            description,
            allowed: &[],
            default: None,
            required: false,
            minimum: None,
            pattern: None,
        }
    }

    const fn integer(name: &'static str, description: &'static str) -> Self {
        Self {
            kind: ParamKind::Integer,
            ..Self::string(name, description)
        }
    }

    const fn one_of(mut self, allowed: &'static [&'static str], default: &'static str) -> Self {
        self.allowed = allowed;
        self.default = Some(default);
        self
    }

    const fn min(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    const fn date(mut self) -> Self {
        self.pattern = Some(r"^\d{4}-\d{2}-\d{2}$");
        self.required = true;
        self
    }

    fn to_schema(&self) -> Value {
        let mut schema = Map::new();
        let kind = match self.kind {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
        };
        schema.insert("type".into(), json!(kind));
        schema.insert("description".into(), json!(self.description));
        if !self.allowed.is_empty() {
            schema.insert("enum".into(), json!(self.allowed));
        }
        if let Some(default) = self.default {
            schema.insert("default".into(), json!(default));
        }
        if let Some(minimum) = self.minimum {
            schema.insert("minimum".into(), json!(minimum));
        }
        if let Some(pattern) = self.pattern {
            schema.insert("pattern".into(), json!(pattern));
        }
        Value::Object(schema)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ToolDescriptor {
    pub tool: ToolName,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl ToolDescriptor {
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// JSON Schema for the tool's arguments.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.to_schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.tool.as_str(),
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

const SCOPES: &[&str] = &["System", "Device"];

const SCOPE: ParamSpec = ParamSpec::string("scope", "Data scope").one_of(SCOPES, defaults::SCOPE);

pub const TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        tool: ToolName::GetApiVersion,
        description: "Get Fronius Solar API version information",
        params: &[],
    },
    ToolDescriptor {
        tool: ToolName::GetSystemStatus,
        description: "Get system status and logger information",
        params: &[],
    },
    ToolDescriptor {
        tool: ToolName::GetLoggerLedInfo,
        description: "Get logger LED status information",
        params: &[],
    },
    ToolDescriptor {
        tool: ToolName::GetInverterInfo,
        description: "Get static inverter information",
        params: &[ParamSpec::integer(
            "deviceId",
            "Specific device ID (optional, defaults to all devices)",
        )
        .min(1)],
    },
    ToolDescriptor {
        tool: ToolName::GetInverterRealtime,
        description: "Get real-time inverter data including power, energy, voltage, current",
        params: &[
            ParamSpec::integer(
                "deviceId",
                "Specific device ID (optional, defaults to system scope)",
            )
            .min(1),
            ParamSpec::string("dataCollection", "Data collection type").one_of(
                &[
                    "CommonInverterData",
                    "CumulationInverterData",
                    "3PInverterData",
                    "MinMaxInverterData",
                ],
                defaults::INVERTER_DATA_COLLECTION,
            ),
        ],
    },
    ToolDescriptor {
        tool: ToolName::GetMeterRealtime,
        description: "Get real-time smart meter data",
        params: &[SCOPE],
    },
    ToolDescriptor {
        tool: ToolName::GetPowerflowRealtime,
        description: "Get real-time power flow data showing energy production, consumption, and grid interaction",
        params: &[],
    },
    ToolDescriptor {
        tool: ToolName::GetArchiveData,
        description: "Get historical archive data for a specific time period",
        params: &[
            ParamSpec::string("startDate", "Start date in YYYY-MM-DD format").date(),
            ParamSpec::string("endDate", "End date in YYYY-MM-DD format").date(),
            ParamSpec::string("channel", "Data channel to retrieve").one_of(
                &[
                    "EnergyReal_WAC_Sum_Produced",
                    "EnergyReal_WAC_Sum_Consumed",
                    "PowerReal_PAC_Sum",
                    "Current_AC_Phase_1",
                    "Voltage_AC_Phase_1",
                    "Temperature_Powerstage",
                ],
                defaults::ARCHIVE_CHANNEL,
            ),
            SCOPE,
            ParamSpec::integer("deviceId", "Device ID (used when scope is Device)").min(1),
        ],
    },
    ToolDescriptor {
        tool: ToolName::GetSensorRealtime,
        description: "Get real-time sensor data (temperature, irradiance, wind, etc.)",
        params: &[
            ParamSpec::string("dataCollection", "Sensor data collection type").one_of(
                &["NowSensorData", "MinMaxSensorData"],
                defaults::SENSOR_DATA_COLLECTION,
            ),
        ],
    },
    ToolDescriptor {
        tool: ToolName::GetStringRealtime,
        description: "Get real-time DC string data (voltage and current per string)",
        params: &[
            ParamSpec::string("dataCollection", "String data collection type").one_of(
                &["NowStringControlData", "LastErrorStringControlData"],
                defaults::STRING_DATA_COLLECTION,
            ),
        ],
    },
    ToolDescriptor {
        tool: ToolName::GetStorageRealtime,
        description: "Get real-time battery storage data (state of charge, power, temperature)",
        params: &[ParamSpec::integer(
            "deviceId",
            "Storage device ID (optional, defaults to system-wide data)",
        )],
    },
    ToolDescriptor {
        tool: ToolName::GetOhmpilotRealtime,
        description: "Get real-time OhmPilot data (smart heating element controller power and temperature)",
        params: &[ParamSpec::integer(
            "deviceId",
            "OhmPilot device ID (optional, defaults to system-wide data)",
        )],
    },
    ToolDescriptor {
        tool: ToolName::GetActiveDevices,
        description: "Get information about active devices in the system",
        params: &[ParamSpec::string("deviceClass", "Device class to query").one_of(
            &["System", "Inverter", "Meter", "Sensor", "StringControl"],
            defaults::DEVICE_CLASS,
        )],
    },
    ToolDescriptor {
        tool: ToolName::TestConnection,
        description: "Test the connection to the Fronius device",
        params: &[],
    },
];

// Every tool sits at its own index; a missing or misplaced entry fails the build.
const _: () = {
    assert!(TOOLS.len() == 14);
    let mut i = 0;
    while i < TOOLS.len() {
        assert!(TOOLS[i].tool.index() == i);
        i += 1;
    }
};

pub fn resource_definitions() -> Vec<Value> {
    RESOURCES.iter().map(ResourceDescriptor::to_json).collect()
}

pub fn tool_definitions() -> Vec<Value> {
    TOOLS.iter().map(ToolDescriptor::to_json).collect()
}
