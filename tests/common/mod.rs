//! Shared helpers for the integration suites.
#![allow(dead_code)]

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use xzmcp::error::{McpError, Result};
use xzmcp::transport::Transport;

// ---------------------------------------------------------------------------
// Channel-backed transport
// ---------------------------------------------------------------------------

/// In-process transport backed by Tokio channels, standing in for a real
/// server in engine and facade tests.
///
/// The test side reads what the client sent from
/// [`ChannelTransportHandle::outbound_rx`] and injects server messages via
/// [`ChannelTransportHandle::inbound_tx`].
#[derive(Debug)]
pub struct ChannelTransport {
    outbound_tx: mpsc::UnboundedSender<String>,
    inbound_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    shutdown: CancellationToken,
}

/// Test-side handle for a [`ChannelTransport`].
#[derive(Debug)]
pub struct ChannelTransportHandle {
    pub outbound_rx: mpsc::UnboundedReceiver<String>,
    pub inbound_tx: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    pub fn new() -> (Self, ChannelTransportHandle) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound_tx,
                inbound_rx: Arc::new(Mutex::new(inbound_rx)),
                shutdown: CancellationToken::new(),
            },
            ChannelTransportHandle {
                outbound_rx,
                inbound_tx,
            },
        )
    }
}

#[async_trait::async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, message: String) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(McpError::ConnectionClosed);
        }
        self.outbound_tx
            .send(message)
            .map_err(|e| McpError::Transport(format!("outbound channel closed: {e}")))
    }

    fn receive(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        let rx = Arc::clone(&self.inbound_rx);
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let mut guard = rx.lock().await;
            let item = guard.recv().await?;
            drop(guard);
            Some((item, rx))
        }))
    }

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

// ---------------------------------------------------------------------------
// JSON-RPC test-side helpers
// ---------------------------------------------------------------------------

/// Read one outbound message and parse it.
pub async fn recv_json(rx: &mut mpsc::UnboundedReceiver<String>) -> serde_json::Value {
    let raw = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for outbound message")
        .expect("outbound channel closed");
    serde_json::from_str(&raw).expect("invalid JSON in outbound message")
}

/// Send a successful JSON-RPC response for `id`.
pub fn send_result(
    tx: &mpsc::UnboundedSender<String>,
    id: &serde_json::Value,
    result: serde_json::Value,
) {
    let resp = serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": result });
    tx.send(serde_json::to_string(&resp).unwrap()).unwrap();
}

/// Send a JSON-RPC error response for `id`.
pub fn send_error(
    tx: &mpsc::UnboundedSender<String>,
    id: &serde_json::Value,
    code: i64,
    message: &str,
) {
    let resp = serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    });
    tx.send(serde_json::to_string(&resp).unwrap()).unwrap();
}

/// Answer a standard handshake on `handle`: respond to `initialize` with the
/// given server capability object and consume the `initialized`
/// notification. Returns the handle for further traffic.
pub async fn serve_handshake(
    mut handle: ChannelTransportHandle,
    server_caps: serde_json::Value,
) -> ChannelTransportHandle {
    let req = recv_json(&mut handle.outbound_rx).await;
    assert_eq!(req["method"], "initialize");
    send_result(
        &handle.inbound_tx,
        &req["id"],
        serde_json::json!({
            "protocolVersion": "2024-11-05",
            "serverInfo": { "name": "mock-server", "version": "1.0" },
            "capabilities": server_caps
        }),
    );
    let notif = recv_json(&mut handle.outbound_rx).await;
    assert_eq!(notif["method"], "notifications/initialized");
    handle
}

// ---------------------------------------------------------------------------
// Minimal SSE event-stream server
// ---------------------------------------------------------------------------

/// A bare-bones HTTP server that answers every request with a long-lived
/// `text/event-stream` response.
///
/// `wiremock` buffers response bodies, so it cannot hold an event stream
/// open; this helper serves the GET side while `wiremock` keeps handling the
/// POST side in transport tests. Each connection first receives
/// `initial_frames`, then whatever is pushed through [`SseTestServer::frames`].
pub struct SseTestServer {
    /// URL of the event stream endpoint.
    pub url: String,
    /// Push additional raw SSE frames to the connected client.
    pub frames: mpsc::UnboundedSender<String>,
    shutdown: CancellationToken,
}

impl SseTestServer {
    pub async fn start(initial_frames: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<String>();
        let frame_rx = Arc::new(Mutex::new(frame_rx));
        let shutdown = CancellationToken::new();

        {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                loop {
                    let mut stream = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        accepted = listener.accept() => match accepted {
                            Ok((stream, _)) => stream,
                            Err(_) => break,
                        },
                    };

                    // Swallow the request head; the test server answers every
                    // request the same way.
                    let mut buf = [0u8; 4096];
                    let _ = stream.read(&mut buf).await;

                    let head = "HTTP/1.1 200 OK\r\n\
                                content-type: text/event-stream\r\n\
                                cache-control: no-cache\r\n\
                                connection: close\r\n\r\n";
                    if stream.write_all(head.as_bytes()).await.is_err() {
                        continue;
                    }
                    for frame in &initial_frames {
                        if stream.write_all(frame.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                    let _ = stream.flush().await;

                    let frame_rx = Arc::clone(&frame_rx);
                    loop {
                        let frame = tokio::select! {
                            _ = shutdown.cancelled() => break,
                            frame = async { frame_rx.lock().await.recv().await } => {
                                match frame {
                                    Some(frame) => frame,
                                    None => break,
                                }
                            }
                        };
                        if stream.write_all(frame.as_bytes()).await.is_err() {
                            break;
                        }
                        let _ = stream.flush().await;
                    }
                }
            });
        }

        Self {
            url: format!("http://127.0.0.1:{port}/sse"),
            frames: frame_tx,
            shutdown,
        }
    }

    /// Close the listener and every open stream.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for SseTestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
