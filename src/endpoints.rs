//! Endpoint catalog of the Fronius Solar API and query-string composition.
//!
//! Query pairs are kept in insertion order so the generated URLs are stable.

use std::fmt;
use std::str::FromStr;

/// Defaults applied when a caller omits an optional parameter. The tool
/// catalog advertises the same values in its schemas.
pub mod defaults {
    pub const INVERTER_DATA_COLLECTION: &str = "CommonInverterData";
    pub const SENSOR_DATA_COLLECTION: &str = "NowSensorData";
    pub const STRING_DATA_COLLECTION: &str = "NowStringControlData";
    pub const ARCHIVE_CHANNEL: &str = "EnergyReal_WAC_Sum_Produced";
    pub const DEVICE_CLASS: &str = "System";
    pub const SCOPE: &str = "System";
}

/// One device endpoint. Paths are relative to `/solar_api/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ApiVersion,
    LoggerInfo,
    LoggerLedInfo,
    InverterInfo,
    InverterRealtime,
    MeterRealtime,
    PowerFlowRealtime,
    ArchiveData,
    SensorRealtime,
    StringRealtime,
    StorageRealtime,
    OhmPilotRealtime,
    ActiveDeviceInfo,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::ApiVersion => "GetAPIVersion.cgi",
            Endpoint::LoggerInfo => "v1/GetLoggerInfo.cgi",
            Endpoint::LoggerLedInfo => "v1/GetLoggerLEDInfo.cgi",
            Endpoint::InverterInfo => "v1/GetInverterInfo.cgi",
            Endpoint::InverterRealtime => "v1/GetInverterRealtimeData.cgi",
            Endpoint::MeterRealtime => "v1/GetMeterRealtimeData.cgi",
            Endpoint::PowerFlowRealtime => "v1/GetPowerFlowRealtimeData.fcgi",
            Endpoint::ArchiveData => "v1/GetArchiveData.cgi",
            Endpoint::SensorRealtime => "v1/GetSensorRealtimeData.cgi",
            Endpoint::StringRealtime => "v1/GetStringRealtimeData.cgi",
            Endpoint::StorageRealtime => "v1/GetStorageRealtimeData.cgi",
            Endpoint::OhmPilotRealtime => "v1/GetOhmPilotRealtimeData.cgi",
            Endpoint::ActiveDeviceInfo => "v1/GetActiveDeviceInfo.cgi",
        }
    }
}

/// `Scope` query parameter: aggregate vs per-unit data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    System,
    Device,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::System => "System",
            Scope::Device => "Device",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "System" => Ok(Scope::System),
            "Device" => Ok(Scope::Device),
            other => Err(format!("invalid scope '{other}' (expected System or Device)")),
        }
    }
}

/// An endpoint plus its ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequest {
    pub endpoint: Endpoint,
    pub query: Vec<(&'static str, String)>,
}

impl DeviceRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// Apply the device-id rule: a non-zero id selects `Scope=Device&DeviceId=N`,
    /// otherwise `Scope=System` with no `DeviceId`.
    pub fn scoped(self, device_id: Option<u32>) -> Self {
        match device_id.filter(|id| *id != 0) {
            Some(id) => self.param("Scope", Scope::Device).param("DeviceId", id),
            None => self.param("Scope", Scope::System),
        }
    }

    /// Relative path and query, e.g. `v1/GetMeterRealtimeData.cgi?Scope=System`.
    pub fn relative(&self) -> String {
        if self.query.is_empty() {
            return self.endpoint.path().to_string();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{k}={}", encode_component(v)))
            .collect();
        format!("{}?{}", self.endpoint.path(), query.join("&"))
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
