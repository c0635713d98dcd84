//! Configuration loading for fronius-mcp.
//!
//! Every setting is resolved from three layers (highest wins):
//!
//! 1. **CLI flag**, e.g. `--host 192.168.1.50`
//! 2. **Environment variable**, e.g. `FRONIUS_HOST`
//! 3. **Built-in default**
//!
//! The layering itself is done by `clap` (`env` + `default_value`). The
//! result is validated by [`Cli::resolve`] into an immutable
//! [`DeviceConfig`] before the device client is constructed. Validation
//! failures halt startup.

use std::fmt;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "fronius-inverter";

/// CLI arguments parsed by `clap`.
#[derive(Parser, Debug)]
#[command(
    name = "fronius-mcp",
    version,
    about = "MCP server for the Fronius Solar API",
    after_help = "Example MCP host configuration:\n  \
        { \"command\": \"fronius-mcp\", \"args\": [\"--host\", \"fronius-inverter.local\"] }"
)]
pub struct Cli {
    /// Fronius inverter hostname or IP address
    #[arg(long, env = "FRONIUS_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Fronius inverter port
    #[arg(short, long, env = "FRONIUS_PORT", default_value_t = 80)]
    pub port: u32,

    /// Protocol used to reach the device
    #[arg(long, env = "FRONIUS_PROTOCOL", value_enum, default_value_t = Protocol::Http)]
    pub protocol: Protocol,

    /// Request timeout in milliseconds
    #[arg(short, long = "timeout", env = "FRONIUS_TIMEOUT", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Default device ID used when a Device scope is requested without an ID
    #[arg(short, long, env = "FRONIUS_DEVICE_ID", default_value_t = 1)]
    pub device_id: u32,

    /// Number of retry attempts for timeouts and connection failures
    #[arg(short, long, env = "FRONIUS_RETRIES", default_value_t = 3)]
    pub retries: u32,

    /// Delay between retries in milliseconds
    #[arg(long = "retry-delay", env = "FRONIUS_RETRY_DELAY", default_value_t = 1_000)]
    pub retry_delay_ms: u64,

    /// Log verbosity (logs go to stderr). `RUST_LOG` takes precedence.
    #[arg(short, long, env = "LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Probe the device, print the result and exit
    #[arg(long)]
    pub test_connection: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// Validated connection settings for one Fronius device.
///
/// Built once at startup and handed to
/// [`FroniusClient`](crate::client::FroniusClient). Serialized verbatim into
/// the `test_connection` tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub timeout_ms: u64,
    pub default_device_id: u32,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl DeviceConfig {
    /// Defaults matching the CLI defaults, for the given host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 80,
            protocol: Protocol::Http,
            timeout_ms: 10_000,
            default_device_id: 1,
            retries: 3,
            retry_delay_ms: 1_000,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// `{protocol}://{host}[:port]/solar_api`. The port is omitted only when it is 80.
    pub fn base_url(&self) -> String {
        let port = if self.port == 80 {
            String::new()
        } else {
            format!(":{}", self.port)
        };
        format!("{}://{}{}/solar_api", self.protocol, self.host, port)
    }
}

/// Fatal configuration problem detected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl Cli {
    /// Validate the parsed arguments and build the device configuration.
    ///
    /// All problems are collected so the operator sees every one of them at once.
    pub fn resolve(&self) -> Result<DeviceConfig, ConfigError> {
        let mut errors = Vec::new();

        let host = self.host.trim();
        if host.is_empty() {
            errors.push("Fronius host is required".to_string());
        }
        let port = match u16::try_from(self.port) {
            Ok(p) if p >= 1 => p,
            _ => {
                errors.push(format!(
                    "Fronius port must be between 1 and 65535 (got {})",
                    self.port
                ));
                0
            }
        };
        if self.timeout_ms < 1_000 {
            errors.push(format!(
                "Fronius timeout must be at least 1000ms (got {})",
                self.timeout_ms
            ));
        }
        if self.device_id < 1 {
            errors.push("Fronius device ID must be positive".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }

        Ok(DeviceConfig {
            host: host.to_string(),
            port,
            protocol: self.protocol,
            timeout_ms: self.timeout_ms,
            default_device_id: self.device_id,
            retries: self.retries,
            retry_delay_ms: self.retry_delay_ms,
        })
    }
}
