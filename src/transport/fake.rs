//! In-process fake transport for MCP unit tests
//!
//! This module provides [`FakeTransport`] and [`FakeTransportHandle`], an
//! in-process pair that replaces real process or network I/O in tests.
//!
//! # Usage
//!
//! Call [`FakeTransport::new`] to obtain a `(FakeTransport, FakeTransportHandle)`
//! pair. Wire the [`FakeTransport`] into the code under test. From the test
//! side, use the [`FakeTransportHandle`] to:
//!
//! - Read what the client sent: `handle.outbound_rx.recv().await`
//! - Inject server responses: `handle.inbound_tx.send(json_string)`
//!
//! Alternatively, call [`FakeTransport::inject_response`] directly on the
//! transport to push a [`serde_json::Value`] as a serialized inbound message.
//!
//! # Channel Wiring
//!
//! From the **client** perspective:
//!
//! ```text
//! client send() -----> outbound_tx -----> outbound_rx (handle reads)
//! handle inbound_tx -> inbound_tx  -----> inbound_rx  (client receive())
//! ```

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::{McpError, Result};
use crate::transport::Transport;

/// In-process fake transport for use in tests.
///
/// Implements the full [`Transport`] trait using in-memory channels, so tests
/// can drive the client without spawning real processes or making network
/// requests.
#[derive(Debug)]
pub struct FakeTransport {
    /// Sender side for `send()`; the handle drains it via `outbound_rx`.
    outbound_tx: mpsc::UnboundedSender<String>,
    /// Shared receiver for the inbound channel, exposed via `receive()`.
    inbound_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    /// Sender used by `inject_response()` (same channel as the handle's
    /// `inbound_tx`).
    inbound_inject_tx: mpsc::UnboundedSender<String>,
    /// Fires when the fake is closed.
    shutdown: CancellationToken,
}

impl FakeTransport {
    /// Create a new `(FakeTransport, FakeTransportHandle)` pair.
    pub fn new() -> (Self, FakeTransportHandle) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();

        let transport = Self {
            outbound_tx,
            inbound_rx: Arc::new(Mutex::new(inbound_rx)),
            inbound_inject_tx: inbound_tx.clone(),
            shutdown: CancellationToken::new(),
        };

        let handle = FakeTransportHandle {
            outbound_rx,
            inbound_tx,
        };

        (transport, handle)
    }

    /// Inject a [`serde_json::Value`] as a server message.
    ///
    /// The value is serialized and pushed onto the inbound channel, so the
    /// next poll of [`Transport::receive`] yields it.
    ///
    /// # Panics
    ///
    /// Panics if the inbound channel has been closed.
    pub fn inject_response(&self, response: serde_json::Value) {
        let serialized =
            serde_json::to_string(&response).expect("FakeTransport: failed to serialize response");
        self.inbound_inject_tx
            .send(serialized)
            .expect("FakeTransport: inbound channel closed before inject_response");
    }
}

/// The test-side handle for a [`FakeTransport`].
///
/// Use this to read messages the client under test sent
/// (`outbound_rx.recv().await`) and to inject server messages the client
/// will receive (`inbound_tx.send(...)`).
#[derive(Debug)]
pub struct FakeTransportHandle {
    /// Receives messages that the client sent via [`Transport::send`].
    pub outbound_rx: mpsc::UnboundedReceiver<String>,
    /// Sends server messages into the client's [`Transport::receive`] stream.
    pub inbound_tx: mpsc::UnboundedSender<String>,
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    /// Record the outbound message so the test can read it via
    /// [`FakeTransportHandle::outbound_rx`].
    async fn send(&self, message: String) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(McpError::ConnectionClosed);
        }
        self.outbound_tx.send(message).map_err(|e| {
            McpError::Transport(format!("FakeTransport outbound channel closed: {}", e))
        })
    }

    /// Returns a stream of messages injected via
    /// [`FakeTransportHandle::inbound_tx`] or [`FakeTransport::inject_response`].
    fn receive(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        let rx = Arc::clone(&self.inbound_rx);
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let mut guard = rx.lock().await;
            let item = guard.recv().await?;
            drop(guard);
            Some((item, rx))
        }))
    }

    /// Always returns an empty stream (the fake transport has no stderr).
    fn receive_err(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        Box::pin(futures::stream::empty())
    }

    fn closed(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    async fn close(&self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use futures::StreamExt;

    #[test]
    fn test_new_succeeds() {
        let (_transport, _handle) = FakeTransport::new();
    }

    #[tokio::test]
    async fn test_send_delivers_to_handle_outbound_rx() {
        let (transport, mut handle) = FakeTransport::new();

        transport
            .send(r#"{"jsonrpc":"2.0","method":"ping"}"#.to_string())
            .await
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), handle.outbound_rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(received, r#"{"jsonrpc":"2.0","method":"ping"}"#);
    }

    #[tokio::test]
    async fn test_receive_yields_message_from_handle_inbound_tx() {
        let (transport, handle) = FakeTransport::new();

        handle
            .inbound_tx
            .send(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#.to_string())
            .unwrap();

        let mut stream = transport.receive();
        let msg = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("timed out")
            .expect("stream ended");
        assert_eq!(msg, r#"{"jsonrpc":"2.0","id":1,"result":{}}"#);
    }

    #[tokio::test]
    async fn test_inject_response_serializes_value() {
        let (transport, _handle) = FakeTransport::new();

        transport.inject_response(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 42,
            "result": { "status": "ok" }
        }));

        let mut stream = transport.receive();
        let msg = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("timed out")
            .expect("stream ended");
        let parsed: serde_json::Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(parsed["id"], 42);
        assert_eq!(parsed["result"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_rejects_sends() {
        let (transport, _handle) = FakeTransport::new();

        transport.close().await;
        transport.close().await;
        assert!(transport.closed().is_cancelled());

        let result = transport.send("{}".to_string()).await;
        assert!(matches!(result, Err(McpError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_send_multiple_messages_ordered() {
        let (transport, mut handle) = FakeTransport::new();

        for i in 0u32..3 {
            transport.send(format!("msg-{}", i)).await.unwrap();
        }
        for i in 0u32..3 {
            let msg = handle.outbound_rx.recv().await.unwrap();
            assert_eq!(msg, format!("msg-{}", i));
        }
    }

    #[test]
    fn test_fake_transport_is_object_safe() {
        let (transport, _handle) = FakeTransport::new();
        let _boxed: Box<dyn Transport> = Box::new(transport);
    }
}
