//! HTTP client for the Fronius Solar API.
//!
//! [`FroniusClient`] composes endpoint URLs, performs the GET through an
//! [`HttpTransport`], unwraps the response [`Envelope`] and exposes one
//! method per device capability. Payloads are returned as
//! `serde_json::Value`; the tools layer formats them for the AI agent.
//!
//! ## Error handling
//!
//! - Non-2xx replies and unparsable bodies are [`TransportError`]s.
//! - A non-zero `Head.Status.Code` is a [`FroniusError::Device`] and is never
//!   retried.
//! - Timeouts and connection failures are retried per [`RetryPolicy`].
//!
//! `GetAPIVersion.cgi` is special: it has no envelope and is attempted once.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DeviceConfig;
use crate::endpoints::{defaults, DeviceRequest, Endpoint, Scope};
use crate::error::{FroniusError, TransportError};
use crate::retry::{with_retry, RetryPolicy};
use crate::transport::{HttpTransport, ReqwestTransport, Sleeper, TokioSleeper};
use crate::types::{ApiVersion, Envelope};

/// Parameters of an archive query. Both dates are mandatory (`YYYY-MM-DD`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub channel: Option<String>,
    pub scope: Option<Scope>,
    pub device_id: Option<u32>,
}

/// HTTP client for a single Fronius device.
pub struct FroniusClient {
    config: DeviceConfig,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
}

impl FroniusClient {
    /// Create a client talking to the device over real HTTP.
    pub fn new(config: DeviceConfig) -> Result<Self, FroniusError> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(
            config,
            Arc::new(transport),
            Arc::new(TokioSleeper),
        ))
    }

    /// Create a client over an arbitrary transport and retry sleeper.
    pub fn with_transport(
        config: DeviceConfig,
        transport: Arc<dyn HttpTransport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let base_url = config.base_url();
        Self {
            config,
            base_url,
            transport,
            sleeper,
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// `{protocol}://{host}[:port]/solar_api` (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the whole configuration and recompute the base URL.
    pub fn update_config(&mut self, config: DeviceConfig) {
        self.base_url = config.base_url();
        self.config = config;
    }

    fn url_for(&self, request: &DeviceRequest) -> String {
        format!("{}/{}", self.base_url, request.relative())
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.config.retries,
            delay: self.config.retry_delay(),
        }
    }

    /// One GET, decoded as JSON.
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FroniusError> {
        let body = self.transport.get(url, self.config.timeout()).await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()).into())
    }

    /// Request an enveloped endpoint and return its `Body`, retrying transient failures.
    pub async fn request<T: DeserializeOwned>(
        &self,
        request: DeviceRequest,
    ) -> Result<T, FroniusError> {
        let url = self.url_for(&request);
        let result = with_retry(self.retry_policy(), self.sleeper.as_ref(), |attempt| {
            let url = url.as_str();
            async move {
                debug!(attempt = attempt + 1, "GET {url}");
                let envelope: Envelope<Value> = self.fetch_json(url).await?;
                let status = envelope.head.status;
                if status.code != 0 {
                    return Err(FroniusError::Device {
                        code: status.code,
                        reason: status.reason,
                        user_message: status.user_message,
                    });
                }
                let body = envelope
                    .body
                    .ok_or_else(|| TransportError::Decode("missing field `Body`".into()))?;
                serde_json::from_value(body)
                    .map_err(|e| TransportError::Decode(e.to_string()).into())
            }
        })
        .await;

        match &result {
            Ok(_) => debug!("GET {url} succeeded"),
            Err(e) => warn!("GET {url} failed: {e}"),
        }
        result
    }

    /// `GetAPIVersion.cgi`: bare JSON, single attempt. Doubles as the connectivity probe.
    pub async fn api_version(&self) -> Result<ApiVersion, FroniusError> {
        let url = self.url_for(&DeviceRequest::new(Endpoint::ApiVersion));
        debug!("GET {url}");
        self.fetch_json(&url).await
    }

    /// `true` only if the version probe completes without any failure.
    pub async fn test_connection(&self) -> bool {
        match self.api_version().await {
            Ok(version) => {
                debug!(api_version = ?version.version(), "connection test succeeded");
                true
            }
            Err(e) => {
                warn!("connection test failed: {e}");
                false
            }
        }
    }

    /// `GetLoggerInfo.cgi`: logger and system information.
    pub async fn system_status(&self) -> Result<Value, FroniusError> {
        self.request(DeviceRequest::new(Endpoint::LoggerInfo)).await
    }

    /// `GetLoggerLEDInfo.cgi`: state of the logger's status LEDs.
    pub async fn logger_led_info(&self) -> Result<Value, FroniusError> {
        self.request(DeviceRequest::new(Endpoint::LoggerLedInfo))
            .await
    }

    /// `GetInverterInfo.cgi`: static data of every inverter, or of one.
    pub async fn inverter_info(&self, device_id: Option<u32>) -> Result<Value, FroniusError> {
        self.request(DeviceRequest::new(Endpoint::InverterInfo).scoped(device_id))
            .await
    }

    /// `GetInverterRealtimeData.cgi`: power, energy, voltages and currents.
    pub async fn inverter_realtime(
        &self,
        device_id: Option<u32>,
        data_collection: Option<&str>,
    ) -> Result<Value, FroniusError> {
        let request = DeviceRequest::new(Endpoint::InverterRealtime)
            .scoped(device_id)
            .param(
                "DataCollection",
                data_collection.unwrap_or(defaults::INVERTER_DATA_COLLECTION),
            );
        self.request(request).await
    }

    /// `GetMeterRealtimeData.cgi`. Device scope targets the configured default device.
    pub async fn meter_realtime(&self, scope: Option<Scope>) -> Result<Value, FroniusError> {
        let scope = scope.unwrap_or_default();
        let mut request = DeviceRequest::new(Endpoint::MeterRealtime).param("Scope", scope);
        // The meter endpoint takes no device id argument; Device scope
        // addresses the configured default device.
        if scope == Scope::Device {
            request = request.param("DeviceId", self.config.default_device_id);
        }
        self.request(request).await
    }

    /// `GetPowerFlowRealtimeData.fcgi`: PV, grid, load and storage flows of the site.
    pub async fn power_flow_realtime(&self) -> Result<Value, FroniusError> {
        self.request(DeviceRequest::new(Endpoint::PowerFlowRealtime))
            .await
    }

    /// `GetArchiveData.cgi`: historical data. Fails with
    /// [`FroniusError::Input`] before any request if a date is missing or malformed.
    pub async fn archive_data(&self, query: &ArchiveQuery) -> Result<Value, FroniusError> {
        let (start, end) = match (&query.start_date, &query.end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(FroniusError::Input(
                    "startDate and endDate are required for archive data".into(),
                ))
            }
        };
        validate_date("startDate", start)?;
        validate_date("endDate", end)?;

        let scope = query.scope.unwrap_or_default();
        let mut request = DeviceRequest::new(Endpoint::ArchiveData)
            .param("Scope", scope)
            .param("StartDate", start)
            .param("EndDate", end)
            .param(
                "Channel",
                query.channel.as_deref().unwrap_or(defaults::ARCHIVE_CHANNEL),
            );
        // Device scope always names a device: the caller's id, else the configured default.
        if scope == Scope::Device {
            let id = query
                .device_id
                .filter(|id| *id != 0)
                .unwrap_or(self.config.default_device_id);
            request = request.param("DeviceId", id);
        }
        self.request(request).await
    }

    /// `GetSensorRealtimeData.cgi`: sensor card readings (always system scope).
    pub async fn sensor_realtime(&self, data_collection: Option<&str>) -> Result<Value, FroniusError> {
        let request = DeviceRequest::new(Endpoint::SensorRealtime)
            .scoped(None)
            .param(
                "DataCollection",
                data_collection.unwrap_or(defaults::SENSOR_DATA_COLLECTION),
            );
        self.request(request).await
    }

    /// `GetStringRealtimeData.cgi`: string control data (always system scope).
    pub async fn string_realtime(&self, data_collection: Option<&str>) -> Result<Value, FroniusError> {
        let request = DeviceRequest::new(Endpoint::StringRealtime)
            .scoped(None)
            .param(
                "DataCollection",
                data_collection.unwrap_or(defaults::STRING_DATA_COLLECTION),
            );
        self.request(request).await
    }

    /// Battery storage: state of charge, power, temperature.
    pub async fn storage_realtime(&self, device_id: Option<u32>) -> Result<Value, FroniusError> {
        self.request(DeviceRequest::new(Endpoint::StorageRealtime).scoped(device_id))
            .await
    }

    /// `GetOhmPilotRealtimeData.cgi`: heating element power and temperature.
    pub async fn ohmpilot_realtime(&self, device_id: Option<u32>) -> Result<Value, FroniusError> {
        self.request(DeviceRequest::new(Endpoint::OhmPilotRealtime).scoped(device_id))
            .await
    }

    /// `GetActiveDeviceInfo.cgi`: devices currently seen by the logger, per class.
    pub async fn active_devices(&self, device_class: Option<&str>) -> Result<Value, FroniusError> {
        let request = DeviceRequest::new(Endpoint::ActiveDeviceInfo)
            .param("DeviceClass", device_class.unwrap_or(defaults::DEVICE_CLASS));
        self.request(request).await
    }
}

fn validate_date(name: &str, value: &str) -> Result<(), FroniusError> {
    if value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        Ok(())
    } else {
        Err(FroniusError::Input(format!(
            "{name} must be a date in YYYY-MM-DD format (got '{value}')"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::{FakeTransport, RecordingSleeper};
    use serde_json::json;

    const BASE: &str = "http://inverter/solar_api";

    fn client_with(retries: u32) -> (FroniusClient, FakeTransport) {
        let transport = FakeTransport::new();
        let mut config = DeviceConfig::new("inverter");
        config.retries = retries;
        config.retry_delay_ms = 0;
        let client = FroniusClient::with_transport(
            config,
            Arc::new(transport.clone()),
            Arc::new(RecordingSleeper::default()),
        );
        (client, transport)
    }

    #[tokio::test]
    async fn retries_timeouts_then_returns_body() {
        let (client, transport) = client_with(2);
        transport
            .push_timeout()
            .push_timeout()
            .push_envelope(json!({ "Data": { "PAC": { "Value": 1200 } } }));

        let body = client.inverter_realtime(None, None).await.unwrap();
        assert_eq!(body["Data"]["PAC"]["Value"], 1200);
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn device_error_is_not_retried() {
        let (client, transport) = client_with(3);
        transport.push_device_error(255, "Query not supported");

        let err = client.power_flow_realtime().await.unwrap_err();
        assert!(matches!(err, FroniusError::Device { code: 255, .. }));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn error_envelope_without_body_is_a_device_error() {
        let (client, transport) = client_with(3);
        transport.push_json(json!({
            "Head": {
                "Status": { "Code": 8, "Reason": "Invalid date range", "UserMessage": "" },
                "Timestamp": "2024-05-01T12:00:00+02:00"
            }
        }));

        let err = client.meter_realtime(None).await.unwrap_err();
        assert!(matches!(err, FroniusError::Device { code: 8, .. }));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn success_envelope_without_body_is_a_decode_error() {
        let (client, transport) = client_with(3);
        transport.push_json(json!({ "Head": { "Status": { "Code": 0 } } }));

        let err = client.system_status().await.unwrap_err();
        assert!(matches!(err, FroniusError::Transport(TransportError::Decode(_))));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn http_status_error_is_not_retried() {
        let (client, transport) = client_with(3);
        transport.push(Err(TransportError::Status {
            status: 404,
            reason: "Not Found".into(),
        }));

        let err = client.system_status().await.unwrap_err();
        assert_eq!(err.to_string(), "Fronius API request failed: HTTP 404: Not Found");
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_transport_error() {
        let (client, transport) = client_with(1);
        transport.push_timeout().push_timeout().push_envelope(json!({}));

        let err = client.logger_led_info().await.unwrap_err();
        assert!(matches!(
            err,
            FroniusError::Transport(TransportError::Timeout(_))
        ));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let (client, transport) = client_with(3);
        transport.push(Ok("<html>".into()));

        let err = client.system_status().await.unwrap_err();
        assert!(matches!(err, FroniusError::Transport(TransportError::Decode(_))));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn inverter_realtime_scope_follows_device_id() {
        let (client, transport) = client_with(0);
        transport.push_envelope(json!({})).push_envelope(json!({}));

        client.inverter_realtime(None, None).await.unwrap();
        let system = transport.last_request().unwrap();
        assert!(system.contains("Scope=System"));
        assert!(!system.contains("DeviceId"));

        client.inverter_realtime(Some(3), None).await.unwrap();
        assert_eq!(
            transport.last_request().unwrap(),
            format!(
                "{BASE}/v1/GetInverterRealtimeData.cgi?Scope=Device&DeviceId=3&DataCollection=CommonInverterData"
            )
        );
    }

    #[tokio::test]
    async fn archive_without_start_date_makes_no_request() {
        let (client, transport) = client_with(3);
        let query = ArchiveQuery {
            end_date: Some("2024-05-01".into()),
            ..Default::default()
        };

        let err = client.archive_data(&query).await.unwrap_err();
        assert!(matches!(err, FroniusError::Input(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn archive_rejects_malformed_dates() {
        let (client, transport) = client_with(0);
        let query = ArchiveQuery {
            start_date: Some("2024-13-01".into()),
            end_date: Some("2024-05-01".into()),
            ..Default::default()
        };

        let err = client.archive_data(&query).await.unwrap_err();
        assert!(err.to_string().contains("startDate"));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn archive_query_order_and_device_scope() {
        let (client, transport) = client_with(0);
        transport.push_envelope(json!({})).push_envelope(json!({}));

        let mut query = ArchiveQuery {
            start_date: Some("2024-05-01".into()),
            end_date: Some("2024-05-02".into()),
            device_id: Some(2),
            ..Default::default()
        };
        client.archive_data(&query).await.unwrap();
        assert_eq!(
            transport.last_request().unwrap(),
            format!(
                "{BASE}/v1/GetArchiveData.cgi?Scope=System&StartDate=2024-05-01&EndDate=2024-05-02&Channel=EnergyReal_WAC_Sum_Produced"
            )
        );

        query.scope = Some(Scope::Device);
        query.channel = Some("PowerReal_PAC_Sum".into());
        client.archive_data(&query).await.unwrap();
        assert!(transport
            .last_request()
            .unwrap()
            .ends_with("Scope=Device&StartDate=2024-05-01&EndDate=2024-05-02&Channel=PowerReal_PAC_Sum&DeviceId=2"));
    }

    #[tokio::test]
    async fn query_strings_are_stable() {
        let (client, transport) = client_with(0);
        for _ in 0..8 {
            transport.push_envelope(json!({}));
        }

        client.inverter_info(None).await.unwrap();
        client.meter_realtime(Some(Scope::Device)).await.unwrap();
        client.sensor_realtime(None).await.unwrap();
        client.string_realtime(Some("LastErrorStringControlData")).await.unwrap();
        client.storage_realtime(Some(1)).await.unwrap();
        client.ohmpilot_realtime(None).await.unwrap();
        client.active_devices(Some("Meter")).await.unwrap();
        client.power_flow_realtime().await.unwrap();

        let paths: Vec<String> = transport
            .requests()
            .into_iter()
            .map(|u| u.trim_start_matches(BASE).to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/v1/GetInverterInfo.cgi?Scope=System",
                "/v1/GetMeterRealtimeData.cgi?Scope=Device&DeviceId=1",
                "/v1/GetSensorRealtimeData.cgi?Scope=System&DataCollection=NowSensorData",
                "/v1/GetStringRealtimeData.cgi?Scope=System&DataCollection=LastErrorStringControlData",
                "/v1/GetStorageRealtimeData.cgi?Scope=Device&DeviceId=1",
                "/v1/GetOhmPilotRealtimeData.cgi?Scope=System",
                "/v1/GetActiveDeviceInfo.cgi?DeviceClass=Meter",
                "/v1/GetPowerFlowRealtimeData.fcgi",
            ]
        );
    }

    #[tokio::test]
    async fn api_version_is_returned_unwrapped() {
        let (client, transport) = client_with(3);
        let raw = json!({
            "APIVersion": "1.0",
            "BaseURL": "/solar_api/v1/",
            "CompatibilityRange": "1.6-4"
        });
        transport.push_json(raw.clone());

        let version = client.api_version().await.unwrap();
        assert_eq!(serde_json::to_value(&version).unwrap(), raw);
        assert_eq!(
            transport.last_request().unwrap(),
            format!("{BASE}/GetAPIVersion.cgi")
        );
    }

    #[tokio::test]
    async fn api_version_keeps_nulls_and_unknown_shapes() {
        let (client, transport) = client_with(0);
        let raw = json!({ "APIVersion": 1, "BaseURL": null });
        transport.push_json(raw.clone()).push_json(json!({ "BaseURL": "/solar_api/v1/" }));

        let version = client.api_version().await.unwrap();
        assert_eq!(version.into_value(), raw);
        assert!(client.test_connection().await);
    }

    #[tokio::test]
    async fn api_version_is_attempted_once() {
        let (client, transport) = client_with(3);
        transport.push_timeout().push_json(json!({ "APIVersion": 1 }));

        assert!(client.api_version().await.is_err());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_connection_reports_bool() {
        let (client, transport) = client_with(0);
        transport
            .push_json(json!({ "APIVersion": 1, "BaseURL": "/solar_api/v1/" }))
            .push_timeout()
            .push(Err(TransportError::Status {
                status: 500,
                reason: "Internal Server Error".into(),
            }))
            .push(Ok("not json".into()));

        assert!(client.test_connection().await);
        assert!(!client.test_connection().await);
        assert!(!client.test_connection().await);
        assert!(!client.test_connection().await);
    }

    #[test]
    fn update_config_recomputes_base_url() {
        let (mut client, _) = client_with(0);
        assert_eq!(client.base_url(), BASE);

        let mut config = client.config().clone();
        config.host = "10.0.0.7".into();
        config.port = 8080;
        client.update_config(config);
        assert_eq!(client.base_url(), "http://10.0.0.7:8080/solar_api");
        assert_eq!(client.config().port, 8080);
    }
}
