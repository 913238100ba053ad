//! MCP transport abstraction and implementations
//!
//! This module defines the [`Transport`] trait that all MCP transport
//! implementations must satisfy. Concrete implementations live in
//! submodules:
//!
//! - [`stdio::StdioTransport`] -- spawns a child process and communicates
//!   over its stdin/stdout pipes (newline-delimited JSON).
//! - [`sse::SseTransport`] -- HTTP+SSE transport: a persistent GET carries
//!   inbound events, POSTs to a handshake-discovered endpoint carry outbound
//!   messages.
//! - [`fake::FakeTransport`] -- in-process fake used in unit tests
//!   (cfg(test) only).
//!
//! # Design
//!
//! The [`Transport`] trait is intentionally minimal: callers `send` a
//! serialized JSON-RPC string and `receive` a stream of serialized JSON-RPC
//! strings (one per logical message, delivered in wire order). Framing and
//! session management are the responsibility of each concrete
//! implementation.
//!
//! A transport is permanently closed at most once. [`Transport::closed`]
//! returns a [`CancellationToken`] whose `cancelled()` future completes when
//! that happens, whether through [`Transport::close`], remote disconnect, or
//! an unrecoverable I/O error.
//!
//! The `receive_err` stream carries transport-level diagnostics (e.g. stderr
//! output from a child process). Diagnostic output MUST NOT be treated as an
//! error condition.

use std::pin::Pin;

use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Abstraction over MCP transport implementations.
///
/// Implementations exist for stdio (child process) and HTTP+SSE. A
/// [`fake::FakeTransport`] is provided for tests. The trait is used
/// polymorphically through `Arc<dyn Transport>`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Send a complete JSON-RPC message string to the remote peer.
    ///
    /// The string MUST be a single, complete JSON object. The transport is
    /// responsible for any framing required by the underlying medium (e.g.
    /// appending a newline for stdio, or issuing an HTTP POST for SSE).
    /// Messages are delivered in submission order.
    ///
    /// # Arguments
    ///
    /// * `message` - A serialized JSON-RPC 2.0 message (request or
    ///   notification).
    ///
    /// # Errors
    ///
    /// Returns [`crate::McpError::Transport`] if the underlying I/O operation
    /// fails, [`crate::McpError::AuthRequired`] on an HTTP 401,
    /// [`crate::McpError::SessionTerminated`] on an HTTP 404, and
    /// [`crate::McpError::ConnectionClosed`] once the transport is closed.
    async fn send(&self, message: String) -> Result<()>;

    /// Returns a stream of inbound JSON-RPC message strings.
    ///
    /// Each item is a single, complete JSON object with leading/trailing
    /// whitespace stripped, delivered in the order received on the wire. The
    /// stream ends when the transport is closed or the remote peer
    /// disconnects.
    fn receive(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>>;

    /// Returns a stream of transport-level diagnostic strings.
    ///
    /// For stdio transports this carries lines written to the child
    /// process's stderr. Diagnostic output is informational only.
    fn receive_err(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>>;

    /// Returns the single-shot close signal for this transport.
    ///
    /// The returned token is cancelled exactly once, when the transport
    /// becomes permanently closed (normally or in error). Await
    /// `closed().cancelled()` to observe teardown.
    fn closed(&self) -> CancellationToken;

    /// Close the transport.
    ///
    /// Idempotent; triggers the [`Transport::closed`] signal and releases
    /// underlying process/socket resources best-effort.
    async fn close(&self);
}

pub mod sse;
pub mod stdio;

#[cfg(test)]
pub mod fake;
