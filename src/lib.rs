//! # fronius-mcp
//!
//! MCP (Model Context Protocol) server exposing a Fronius solar inverter's
//! local Solar API as resources and tools. Runs as a stdio JSON-RPC server,
//! launched by an AI agent host.
//!
//! ## Architecture
//!
//! ```text
//! config.rs      CLI / env-var configuration and validation
//! transport/     HTTP seam (reqwest) and retry sleeper
//! retry.rs       bounded retry loop for transient failures
//! endpoints.rs   Solar API paths and query composition
//! types.rs       response envelope and version payload
//! client.rs      one method per device capability
//! catalog.rs     resource and tool descriptors with parameter schemas
//! tools.rs       tool argument parsing and dispatch
//! resources.rs   resource reads
//! outcome.rs     success/failure capture shared by both dispatchers
//! mcp.rs         MCP JSON-RPC protocol handler (stdio)
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod mcp;
pub mod outcome;
pub mod resources;
pub mod retry;
pub mod tools;
pub mod transport;
pub mod types;
