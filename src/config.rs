//! MCP client configuration types
//!
//! This module defines configuration structures for MCP server connections
//! and for the client itself. [`StdioServerConfig`] deserializes from the
//! JSON shape used by Claude Desktop and other MCP hosts;
//! [`SseServerConfig`] and [`ClientConfig`] are built programmatically.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::auth::TokenSource;
use crate::types::ClientCapabilities;

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default deadline for tracked tool calls, which tend to run long.
pub const DEFAULT_TRACKING_TIMEOUT: Duration = Duration::from_secs(120);
/// Default idle timeout on the SSE event stream.
pub const DEFAULT_SSE_READ_TIMEOUT: Duration = Duration::from_secs(300);
/// Default bound on concurrent SSE POSTs.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 10;
/// Default deadline for discovering the SSE message endpoint.
pub const DEFAULT_ENDPOINT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a child-process MCP server.
///
/// Matches the JSON shape used by Claude Desktop configs:
///
/// ```json
/// {
///   "command": "npx",
///   "arguments": ["-y", "@modelcontextprotocol/server-filesystem", "/tmp"],
///   "workingDirectory": "/tmp",
///   "environment": { "DEBUG": "1" }
/// }
/// ```
///
/// The child's inherited environment is cleared and rebuilt from
/// `environment`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StdioServerConfig {
    /// The server executable to spawn.
    pub command: PathBuf,
    /// Command-line arguments passed to the executable.
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Optional working directory for the child process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
    /// Environment variables for the child process.
    #[serde(default)]
    pub environment: HashMap<String, String>,
}

impl StdioServerConfig {
    /// Create a config for `command` with no arguments.
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            arguments: Vec::new(),
            working_directory: None,
            environment: HashMap::new(),
        }
    }

    /// Replace the argument list.
    #[must_use]
    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Add one environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}

/// Configuration for an HTTP+SSE MCP server connection.
#[derive(Debug, Clone)]
pub struct SseServerConfig {
    /// URL of the SSE event stream (the GET target).
    pub server_url: Url,
    /// Extra headers merged into every request.
    pub headers: HashMap<String, String>,
    /// Per-POST deadline.
    pub timeout: Duration,
    /// Idle timeout on the event stream; exceeding it closes the transport.
    pub sse_read_timeout: Duration,
    /// Bound on concurrent POSTs to the message endpoint.
    pub max_concurrent_requests: usize,
    /// Whether to DELETE the session when the transport closes.
    pub terminate_on_close: bool,
    /// Deadline for the server to announce the message endpoint.
    pub endpoint_timeout: Duration,
    /// Optional bearer token source consulted before every POST.
    pub token_source: Option<Arc<dyn TokenSource>>,
}

impl SseServerConfig {
    /// Create a config for `server_url` with the default knobs.
    #[must_use]
    pub fn new(server_url: Url) -> Self {
        Self {
            server_url,
            headers: HashMap::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            sse_read_timeout: DEFAULT_SSE_READ_TIMEOUT,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            terminate_on_close: true,
            endpoint_timeout: DEFAULT_ENDPOINT_TIMEOUT,
            token_source: None,
        }
    }

    /// Add one static header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a bearer token source.
    #[must_use]
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }
}

/// Retry policy for the initial handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeRetry {
    /// Maximum number of handshake attempts.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for HandshakeRetry {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Configuration for an [`crate::McpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Client name reported in the `initialize` handshake.
    pub name: String,
    /// Client version reported in the `initialize` handshake.
    pub version: String,
    /// Capabilities this client declares.
    pub capabilities: ClientCapabilities,
    /// Retry policy applied by `connect_with_retry`.
    pub handshake_retry: HandshakeRetry,
    /// Per-request deadline.
    pub request_timeout: Duration,
    /// Deadline for tracked tool calls.
    pub tracking_timeout: Duration,
}

impl ClientConfig {
    /// Create a config identifying the client as `name`/`version`, with
    /// default capabilities and timeouts.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            capabilities: ClientCapabilities::default(),
            handshake_retry: HandshakeRetry::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tracking_timeout: DEFAULT_TRACKING_TIMEOUT,
        }
    }

    /// Declare the client capability set.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: ClientCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}
