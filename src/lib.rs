//! xzmcp - Async Model Context Protocol (MCP) client
//!
//! This library connects a host application to an external MCP server and
//! exposes a typed, capability-gated request/response API for the server's
//! tools, resources, prompts, and sampling facilities over JSON-RPC 2.0.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `types`: MCP protocol types and JSON-RPC 2.0 primitives
//! - `client`: transport-agnostic async JSON-RPC session engine
//! - `protocol`: the typed [`McpClient`] facade (handshake, capability
//!   gating, typed methods)
//! - `transport`: the [`transport::Transport`] trait plus stdio
//!   (child-process) and HTTP+SSE implementations
//! - `registry`: tool metadata cache for token-efficient listings
//! - `auth`: bearer-token seam consulted by the HTTP transport
//! - `config`: connection and client configuration
//! - `error`: error types and the crate-wide result alias
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use xzmcp::config::{ClientConfig, StdioServerConfig};
//! use xzmcp::transport::stdio::StdioTransport;
//! use xzmcp::McpClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let transport = StdioTransport::spawn(
//!         StdioServerConfig::new("npx")
//!             .with_arguments(["-y", "@modelcontextprotocol/server-everything"]),
//!     )?;
//!
//!     let client = McpClient::new(ClientConfig::new("my-host", "1.0.0"));
//!     client.connect(Arc::new(transport)).await?;
//!
//!     let tools = client.list_tools().await?;
//!     let result = client
//!         .call_tool(&tools[0].name, serde_json::json!({ "query": "hello" }))
//!         .await?;
//!     println!("{result:?}");
//!
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::{ClientConfig, SseServerConfig, StdioServerConfig};
pub use error::{McpError, Result};
pub use protocol::McpClient;
pub use registry::ToolRegistry;
pub use types::{
    CallToolResult, Content, McpLogLevel, ServerCapabilities, ServerHealth, Tool, ToolMetadata,
};
