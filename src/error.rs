//! Error types for xzmcp
//!
//! This module defines [`McpError`], the single error enum used throughout
//! the crate, using `thiserror` for ergonomic error handling. Every fallible
//! operation returns [`Result`], so callers can match on the exact failure
//! kind (remote error code, timeout, auth-required, ...) without downcasting.

use thiserror::Error;

/// Main error type for xzmcp operations
///
/// Covers transport I/O, protocol violations, client misuse, remote JSON-RPC
/// errors, timeouts, and session lifecycle failures.
#[derive(Error, Debug)]
pub enum McpError {
    /// Transport-level I/O failure (pipe, socket, HTTP status outside the
    /// mapped cases)
    #[error("MCP transport error: {0}")]
    Transport(String),

    /// Malformed envelope or payload that violates the wire protocol
    #[error("MCP protocol error: {0}")]
    Protocol(String),

    /// Client misuse: already connected, not initialized, missing capability,
    /// invalid argument
    #[error("MCP client error: {0}")]
    Client(String),

    /// The server answered with a JSON-RPC error object
    #[error("MCP server error {code}: {message}")]
    Remote {
        /// Numeric JSON-RPC error code as returned by the server
        code: i64,
        /// Human-readable error description from the server
        message: String,
        /// Optional additional error context
        data: Option<serde_json::Value>,
    },

    /// No response arrived within the request deadline
    #[error("MCP timeout: method={method}")]
    Timeout {
        /// JSON-RPC method that timed out
        method: String,
    },

    /// The server requires authentication (HTTP 401)
    #[error("MCP authentication required: {0}")]
    AuthRequired(String),

    /// The server no longer knows this session (HTTP 404 on the message
    /// endpoint)
    #[error("MCP session terminated by server")]
    SessionTerminated,

    /// The transport closed before the operation completed
    #[error("MCP connection closed")]
    ConnectionClosed,

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for xzmcp operations
pub type Result<T> = std::result::Result<T, McpError>;
