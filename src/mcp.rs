//! MCP (Model Context Protocol) JSON-RPC handler.
//!
//! Reads JSON-RPC 2.0 requests from stdin (one per line) and writes
//! responses to stdout. Logs never go to stdout.
//!
//! ## Supported methods
//!
//! | Method              | Description                          |
//! |---------------------|--------------------------------------|
//! | `initialize`        | Handshake, returns capabilities      |
//! | `ping`              | Liveness check                       |
//! | `resources/list`    | List the device resources            |
//! | `resources/read`    | Read one resource by URI             |
//! | `tools/list`        | List available tool definitions      |
//! | `tools/call`        | Execute a tool and return the result |
//!
//! Notifications (requests without an `id`) are acknowledged silently.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, warn};

use crate::catalog;
use crate::client::FroniusClient;
use crate::resources;
use crate::tools;

const SERVER_NAME: &str = "fronius-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_PARAMS: i64 = -32602;
const METHOD_NOT_FOUND: i64 = -32601;

pub struct McpServer {
    client: FroniusClient,
}

impl McpServer {
    pub fn new(client: FroniusClient) -> Self {
        Self { client }
    }

    /// Run on stdio until EOF.
    pub async fn run_stdio(&self) {
        let reader = BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout()).await;
    }

    /// Process newline-delimited requests from `reader` until EOF.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W)
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    error!("stdin read error: {e}");
                    break;
                }
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Value>(trimmed) {
                Ok(request) => self.handle_message(&request).await,
                Err(e) => {
                    warn!("unparsable request: {e}");
                    Some(error_response(
                        Value::Null,
                        PARSE_ERROR,
                        format!("Parse error: {e}"),
                    ))
                }
            };
            if let Some(response) = response {
                write_response(&mut writer, &response).await;
            }
        }
        debug!("stdin closed");
    }

    /// Handle one decoded message. Returns `None` for notifications.
    pub async fn handle_message(&self, request: &Value) -> Option<Value> {
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");
        let Some(id) = request.get("id").cloned() else {
            debug!("notification: {method}");
            return None;
        };
        let params = request.get("params").cloned().unwrap_or(json!({}));

        let result = match method {
            "initialize" => Ok(handle_initialize()),
            "ping" => Ok(json!({})),
            "resources/list" => Ok(json!({ "resources": catalog::resource_definitions() })),
            "resources/read" => self.handle_resources_read(&params).await,
            "tools/list" => Ok(json!({ "tools": catalog::tool_definitions() })),
            "tools/call" => Ok(self.handle_tools_call(&params).await),
            _ => Err((METHOD_NOT_FOUND, format!("Method not found: {method}"))),
        };

        Some(match result {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err((code, message)) => error_response(id, code, message),
        })
    }

    async fn handle_resources_read(&self, params: &Value) -> Result<Value, (i64, String)> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or((INVALID_PARAMS, "Missing required parameter: uri".to_string()))?;
        let result = resources::read_resource(uri, &self.client).await;
        Ok(json!({ "contents": result.contents }))
    }

    async fn handle_tools_call(&self, params: &Value) -> Value {
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        let result = tools::handle_tool_call(name, &args, &self.client).await;
        let mut response = json!({ "content": result.content });
        if result.is_error {
            response["isError"] = json!(true);
        }
        response
    }
}

fn handle_initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "resources": {},
            "tools": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION
        }
    })
}

fn error_response(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

/// Write one response line and flush.
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Value) {
    let mut output = serde_json::to_string(response).unwrap_or_default();
    output.push('\n');
    if let Err(e) = writer.write_all(output.as_bytes()).await {
        error!("stdout write error: {e}");
    }
    if let Err(e) = writer.flush().await {
        error!("stdout flush error: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::transport::fake::{FakeTransport, RecordingSleeper};
    use std::sync::Arc;

    fn server() -> (McpServer, FakeTransport) {
        let transport = FakeTransport::new();
        let client = FroniusClient::with_transport(
            DeviceConfig::new("inverter"),
            Arc::new(transport.clone()),
            Arc::new(RecordingSleeper::default()),
        );
        (McpServer::new(client), transport)
    }

    async fn call(server: &McpServer, request: Value) -> Value {
        server.handle_message(&request).await.unwrap()
    }

    #[tokio::test]
    async fn initialize_advertises_resources_and_tools() {
        let (server, _) = server();
        let resp = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }),
        )
        .await;
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(resp["result"]["capabilities"], json!({ "resources": {}, "tools": {} }));
        assert_eq!(resp["result"]["serverInfo"]["name"], "fronius-mcp");
    }

    #[tokio::test]
    async fn lists_have_catalog_sizes() {
        let (server, _) = server();
        let tools = call(&server, json!({ "id": 2, "method": "tools/list" })).await;
        assert_eq!(tools["result"]["tools"].as_array().unwrap().len(), 14);
        assert!(tools["result"]["tools"][0]["inputSchema"].is_object());

        let resources = call(&server, json!({ "id": 3, "method": "resources/list" })).await;
        assert_eq!(resources["result"]["resources"].as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn tools_call_sets_is_error_only_on_failure() {
        let (server, transport) = server();
        transport.push_envelope(json!({ "Site": { "P_PV": 3120.5 } }));

        let ok = call(
            &server,
            json!({
                "id": "a",
                "method": "tools/call",
                "params": { "name": "get_powerflow_realtime", "arguments": {} }
            }),
        )
        .await;
        assert_eq!(ok["id"], "a");
        assert!(ok["result"].get("isError").is_none());
        assert_eq!(ok["result"]["content"][0]["type"], "text");

        let failed = call(
            &server,
            json!({
                "id": "b",
                "method": "tools/call",
                "params": { "name": "nope" }
            }),
        )
        .await;
        assert_eq!(failed["result"]["isError"], true);
    }

    #[tokio::test]
    async fn resources_read_requires_uri() {
        let (server, _) = server();
        let resp = call(
            &server,
            json!({ "id": 4, "method": "resources/read", "params": {} }),
        )
        .await;
        assert_eq!(resp["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn unknown_method_and_notifications() {
        let (server, _) = server();
        let resp = call(&server, json!({ "id": 5, "method": "prompts/list" })).await;
        assert_eq!(resp["error"]["code"], METHOD_NOT_FOUND);

        let none = server
            .handle_message(&json!({ "method": "notifications/initialized" }))
            .await;
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn serve_writes_one_line_per_request() {
        let (server, _) = server();
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "not json\n",
        );
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await;

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], json!({ "jsonrpc": "2.0", "id": 1, "result": {} }));
        assert_eq!(lines[1]["id"], Value::Null);
        assert_eq!(lines[1]["error"]["code"], PARSE_ERROR);
    }
}
