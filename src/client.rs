//! Transport-agnostic async JSON-RPC 2.0 session engine
//!
//! This module provides [`JsonRpcClient`], the request/notification
//! multiplexer that sits between the typed protocol facade and a
//! [`Transport`]. Callers issue requests with [`JsonRpcClient::request`] and
//! fire-and-forget notifications with [`JsonRpcClient::notify`];
//! [`start_read_loop`] processes inbound messages concurrently.
//!
//! # Design
//!
//! - Outbound messages are handed directly to the owned transport as
//!   newline-free JSON strings; the transport is responsible for framing and
//!   preserves submission order. A transport failure during `send` (pipe
//!   closed, HTTP 401/404, ...) surfaces to the caller of `request`.
//! - In-flight requests are tracked in a `pending` map keyed by `u64` request
//!   ID. Each entry is a `oneshot::Sender` that receives the `result` or the
//!   mapped error when the matching response arrives.
//! - Every request carries a wall-clock deadline. On timeout the pending
//!   entry is removed, so a late response for a timed-out ID is dropped as
//!   protocol noise.
//! - A [`tokio_util::sync::CancellationToken`] stops the read loop cleanly.
//!   On teardown every pending entry is completed with
//!   [`McpError::ConnectionClosed`] in one fan-out so no caller hangs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::{McpError, Result};
use crate::transport::Transport;
use crate::types::{JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JSONRPC_VERSION};

/// Default timeout applied to every request when the caller does not specify
/// one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A notification handler: called with the raw `params` value when a matching
/// server notification arrives.
type NotificationHandler = Box<dyn Fn(serde_json::Value) + Send + Sync + 'static>;

/// The pending-response map: request ID to the oneshot sender that completes
/// it.
type PendingMap = HashMap<u64, oneshot::Sender<Result<serde_json::Value>>>;

/// Transport-agnostic async JSON-RPC 2.0 session engine.
///
/// Create one with [`JsonRpcClient::new`], passing the transport, then call
/// [`start_read_loop`] with an `Arc` of the client to process incoming
/// messages.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use xzmcp::client::{start_read_loop, JsonRpcClient};
/// use xzmcp::config::StdioServerConfig;
/// use xzmcp::transport::stdio::StdioTransport;
/// use xzmcp::transport::Transport;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let transport: Arc<dyn Transport> =
///         Arc::new(StdioTransport::spawn(StdioServerConfig::new("my-mcp-server"))?);
///     let client = Arc::new(JsonRpcClient::new(transport, Duration::from_secs(30)));
///     let _handle = start_read_loop(Arc::clone(&client), CancellationToken::new());
///     Ok(())
/// }
/// ```
pub struct JsonRpcClient {
    /// Monotonically increasing request ID counter, starting at 1.
    next_id: AtomicU64,
    /// In-flight requests waiting for a response.
    pending: Mutex<PendingMap>,
    /// The transport this session owns.
    transport: Arc<dyn Transport>,
    /// Registered handlers for server-sent notifications (method -> handler).
    notification_handlers: Mutex<HashMap<String, NotificationHandler>>,
    /// Timeout applied when a request does not specify one.
    default_timeout: Duration,
}

impl std::fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcClient")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl JsonRpcClient {
    /// Create a new `JsonRpcClient` over the given transport.
    ///
    /// The caller must also call [`start_read_loop`] for responses and
    /// notifications to be dispatched.
    ///
    /// # Arguments
    ///
    /// * `transport` - The transport this session exclusively owns.
    /// * `default_timeout` - Deadline used by [`JsonRpcClient::request`] when
    ///   the caller passes `None`.
    pub fn new(transport: Arc<dyn Transport>, default_timeout: Duration) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            transport,
            notification_handlers: Mutex::new(HashMap::new()),
            default_timeout,
        }
    }

    /// The transport this session owns.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Send a JSON-RPC request and await the typed response.
    ///
    /// Assigns the next monotonic ID, registers the pending slot, hands the
    /// serialized request to the transport, and waits for the matching
    /// response.
    ///
    /// # Arguments
    ///
    /// * `method` - The JSON-RPC method name.
    /// * `params` - Parameters to serialize into the `params` field.
    /// * `timeout` - Optional deadline; defaults to the client's configured
    ///   timeout.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::ConnectionClosed`] if the transport closed before
    /// a response arrived, [`McpError::Timeout`] if the deadline elapsed,
    /// [`McpError::Remote`] if the server answered with an error object, and
    /// any transport error raised while sending.
    pub async fn request<P, R>(
        &self,
        method: &str,
        params: P,
        timeout: Option<Duration>,
    ) -> Result<R>
    where
        P: serde::Serialize + Send,
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let message = serde_json::to_string(&JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.to_string(),
            params: Some(serde_json::to_value(params)?),
        })?;

        // Register the pending slot before handing the message to the
        // transport so the response can never arrive before we are ready to
        // receive it.
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        if let Err(e) = self.transport.send(message).await {
            self.pending.lock().remove(&id);
            return Err(e);
        }

        let deadline = timeout.unwrap_or(self.default_timeout);
        let outcome = match tokio::time::timeout(deadline, rx).await {
            Ok(received) => received,
            Err(_) => {
                // Remove the slot so a late response for this ID is dropped.
                self.pending.lock().remove(&id);
                return Err(McpError::Timeout {
                    method: method.to_string(),
                });
            }
        };

        // The oneshot was dropped (read loop exited) before a response
        // arrived.
        let value = outcome.map_err(|_| McpError::ConnectionClosed)??;

        Ok(serde_json::from_value(value)?)
    }

    /// Send a JSON-RPC notification (no response expected).
    ///
    /// Notifications have no `id` field and the server MUST NOT reply.
    ///
    /// # Arguments
    ///
    /// * `method` - The notification method name.
    /// * `params` - Parameters to serialize into the `params` field.
    ///
    /// # Errors
    ///
    /// Returns any transport error raised while sending.
    pub async fn notify<P: serde::Serialize + Send>(&self, method: &str, params: P) -> Result<()> {
        let message = serde_json::to_string(&JsonRpcNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params: Some(serde_json::to_value(params)?),
        })?;

        self.transport.send(message).await
    }

    /// Register a handler for a server-sent notification.
    ///
    /// When the read loop receives a notification with a matching `method`,
    /// it calls `f` with the raw `params` value (`serde_json::Value::Null`
    /// when absent). Registering a second handler for the same method
    /// replaces the first.
    ///
    /// Handlers run sequentially on the inbound dispatch task and must not
    /// block it; long work belongs on a task the handler spawns.
    ///
    /// # Arguments
    ///
    /// * `method` - The notification method to listen for.
    /// * `f` - The callback to invoke.
    pub fn on_notification(
        &self,
        method: impl Into<String>,
        f: impl Fn(serde_json::Value) + Send + Sync + 'static,
    ) {
        self.notification_handlers
            .lock()
            .insert(method.into(), Box::new(f));
    }

    /// Complete every in-flight request with [`McpError::ConnectionClosed`].
    ///
    /// Called by the read loop on teardown; exposed to the facade so an
    /// explicit disconnect fans out immediately.
    pub(crate) fn fail_all_pending(&self) {
        let drained: Vec<_> = {
            let mut pending = self.pending.lock();
            pending.drain().collect()
        };
        for (_, tx) in drained {
            // Send errors only mean the caller already gave up (timed out).
            let _ = tx.send(Err(McpError::ConnectionClosed));
        }
    }

    /// Resolve a pending request with the response value or error.
    fn complete(&self, id: u64, outcome: Result<serde_json::Value>) {
        let tx = self.pending.lock().remove(&id);
        let Some(tx) = tx else {
            tracing::warn!("MCP read loop: response for unknown id {id}; dropping");
            return;
        };
        // Ignore send errors: the caller may have already timed out.
        let _ = tx.send(outcome);
    }
}

/// Start the JSON-RPC read loop as a background Tokio task.
///
/// The loop pumps the transport's inbound stream, classifies each message,
/// and dispatches it:
///
/// - **Response** (has `id` and `result` or `error`): resolves the matching
///   pending [`oneshot`] sender. Unknown ids are logged and dropped.
/// - **Notification** (has `method` but no `id`): calls the registered
///   handler, if any. Handler panics are caught and logged, never propagated.
/// - **Anything else** (server-originated requests, unclassifiable frames):
///   logged and ignored; this core is client-only.
///
/// The loop exits when `cancellation` fires, the transport's close signal
/// fires, or the inbound stream ends. In every case, all pending senders are
/// completed with [`McpError::ConnectionClosed`] so no in-flight `request()`
/// call blocks indefinitely.
///
/// # Arguments
///
/// * `client` - Shared reference to the client whose pending map to service.
/// * `cancellation` - Token used to stop the loop gracefully.
///
/// # Returns
///
/// A [`tokio::task::JoinHandle`] for the background task.
pub fn start_read_loop(
    client: Arc<JsonRpcClient>,
    cancellation: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let transport = Arc::clone(&client.transport);
        let transport_closed = transport.closed();
        let mut inbound = transport.receive();

        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,
                _ = transport_closed.cancelled() => break,

                maybe_msg = inbound.next() => {
                    match maybe_msg {
                        Some(raw) => dispatch_message(&raw, &client),
                        None => break,
                    }
                }
            }
        }

        drop(inbound);
        client.fail_all_pending();
    })
}

/// Classify and dispatch a single inbound JSON string.
///
/// Extracted from the loop body to keep `start_read_loop` readable and to
/// allow direct unit testing of the dispatch logic.
fn dispatch_message(raw: &str, client: &JsonRpcClient) {
    let message: JsonRpcMessage = match serde_json::from_str(raw) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("MCP read loop: failed to parse inbound JSON: {e}");
            return;
        }
    };

    match message {
        JsonRpcMessage::Response(response) => {
            // Narrow the echoed id to the u64 space this client allocates in.
            let id = match response.id.as_u64() {
                Some(n) => n,
                None => match response.id.as_str().and_then(|s| s.parse::<u64>().ok()) {
                    Some(n) => n,
                    None => {
                        tracing::warn!(
                            "MCP read loop: response has non-integer id {}; dropping",
                            response.id
                        );
                        return;
                    }
                },
            };

            let outcome = match response.error {
                Some(error) => Err(McpError::Remote {
                    code: error.code,
                    message: error.message,
                    data: error.data,
                }),
                None => Ok(response.result.unwrap_or(serde_json::Value::Null)),
            };
            client.complete(id, outcome);
        }
        JsonRpcMessage::Notification(notification) => {
            let params = notification.params.unwrap_or(serde_json::Value::Null);
            let handlers = client.notification_handlers.lock();
            if let Some(handler) = handlers.get(&notification.method) {
                // Isolate handler panics; the dispatch task must survive them.
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    handler(params);
                }));
                if result.is_err() {
                    tracing::warn!(
                        "MCP read loop: handler for '{}' panicked",
                        notification.method
                    );
                }
            } else {
                tracing::debug!(
                    "MCP read loop: no handler for notification '{}'; ignoring",
                    notification.method
                );
            }
        }
        JsonRpcMessage::Request(request) => {
            tracing::debug!(
                "MCP read loop: ignoring server-originated request '{}'",
                request.method
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeTransport;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::time::Duration;

    /// Build an in-process client over a fake transport.
    fn wired_client() -> (
        Arc<JsonRpcClient>,
        crate::transport::fake::FakeTransportHandle,
        CancellationToken,
    ) {
        let (transport, handle) = FakeTransport::new();
        let client = Arc::new(JsonRpcClient::new(
            Arc::new(transport),
            Duration::from_secs(5),
        ));
        let token = CancellationToken::new();
        start_read_loop(Arc::clone(&client), token.clone());
        (client, handle, token)
    }

    #[tokio::test]
    async fn test_request_resolves_with_correct_result() {
        let (client, mut handle, _token) = wired_client();

        tokio::spawn(async move {
            let sent = handle.outbound_rx.recv().await.unwrap();
            let req: serde_json::Value = serde_json::from_str(&sent).unwrap();
            let response = serde_json::json!({
                "jsonrpc": "2.0",
                "id": req["id"],
                "result": { "tools": [] }
            });
            handle
                .inbound_tx
                .send(serde_json::to_string(&response).unwrap())
                .unwrap();
        });

        #[derive(serde::Deserialize, PartialEq, Debug)]
        struct ToolsListResult {
            tools: Vec<serde_json::Value>,
        }

        let result: Result<ToolsListResult> = client
            .request("tools/list", serde_json::json!({}), None)
            .await;
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        assert!(result.unwrap().tools.is_empty());
    }

    #[tokio::test]
    async fn test_request_ids_are_strictly_increasing_from_one() {
        let (client, mut handle, _token) = wired_client();

        tokio::spawn(async move {
            for _ in 0..3u32 {
                let sent = handle.outbound_rx.recv().await.unwrap();
                let req: serde_json::Value = serde_json::from_str(&sent).unwrap();
                let resp = serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": req["id"],
                    "result": { "echo": req["id"] }
                });
                handle
                    .inbound_tx
                    .send(serde_json::to_string(&resp).unwrap())
                    .unwrap();
            }
        });

        let mut ids = Vec::new();
        for _ in 0..3 {
            let v: serde_json::Value = client
                .request("ping", serde_json::json!({}), None)
                .await
                .unwrap();
            ids.push(v["echo"].as_u64().unwrap());
        }
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_request_timeout_fires_and_late_response_is_dropped() {
        let (client, mut handle, _token) = wired_client();

        let result: Result<serde_json::Value> = client
            .request(
                "tools/list",
                serde_json::json!({}),
                Some(Duration::from_millis(50)),
            )
            .await;

        assert!(matches!(
            result,
            Err(McpError::Timeout { ref method }) if method == "tools/list"
        ));

        // A late response for the timed-out id must be dropped as noise and
        // must not break the next request on the same session.
        let sent = handle.outbound_rx.recv().await.unwrap();
        let stale: serde_json::Value = serde_json::from_str(&sent).unwrap();
        handle
            .inbound_tx
            .send(
                serde_json::to_string(&serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": stale["id"],
                    "result": { "too": "late" }
                }))
                .unwrap(),
            )
            .unwrap();

        tokio::spawn(async move {
            let sent = handle.outbound_rx.recv().await.unwrap();
            let req: serde_json::Value = serde_json::from_str(&sent).unwrap();
            handle
                .inbound_tx
                .send(
                    serde_json::to_string(&serde_json::json!({
                        "jsonrpc": "2.0",
                        "id": req["id"],
                        "result": { "fresh": true }
                    }))
                    .unwrap(),
                )
                .unwrap();
        });

        let v: serde_json::Value = client
            .request("ping", serde_json::json!({}), None)
            .await
            .unwrap();
        assert_eq!(v["fresh"], true);
    }

    #[tokio::test]
    async fn test_json_rpc_error_response_mapped_to_remote_error() {
        let (client, mut handle, _token) = wired_client();

        tokio::spawn(async move {
            let sent = handle.outbound_rx.recv().await.unwrap();
            let req: serde_json::Value = serde_json::from_str(&sent).unwrap();
            let response = serde_json::json!({
                "jsonrpc": "2.0",
                "id": req["id"],
                "error": { "code": -32601, "message": "Method not found" }
            });
            handle
                .inbound_tx
                .send(serde_json::to_string(&response).unwrap())
                .unwrap();
        });

        let result: Result<serde_json::Value> = client
            .request("nonexistent/method", serde_json::json!({}), None)
            .await;

        match result {
            Err(McpError::Remote { code, message, .. }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("expected Remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pending_completed_on_read_loop_cancellation() {
        let (client, _handle, token) = wired_client();

        let client_clone = Arc::clone(&client);
        let request_task = tokio::spawn(async move {
            client_clone
                .request::<_, serde_json::Value>(
                    "tools/list",
                    serde_json::json!({}),
                    Some(Duration::from_secs(10)),
                )
                .await
        });

        // Give the request time to register in pending.
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let outcome = tokio::time::timeout(Duration::from_secs(2), request_task)
            .await
            .expect("request did not complete after loop exit")
            .expect("task panicked");

        assert!(matches!(outcome, Err(McpError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_pending_completed_when_transport_closes() {
        let (transport, _handle) = FakeTransport::new();
        let transport = Arc::new(transport);
        let client = Arc::new(JsonRpcClient::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Duration::from_secs(10),
        ));
        start_read_loop(Arc::clone(&client), CancellationToken::new());

        let client_clone = Arc::clone(&client);
        let request_task = tokio::spawn(async move {
            client_clone
                .request::<_, serde_json::Value>("tools/list", serde_json::json!({}), None)
                .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        transport.close().await;

        let outcome = tokio::time::timeout(Duration::from_secs(2), request_task)
            .await
            .expect("request did not complete after transport close")
            .expect("task panicked");
        assert!(matches!(outcome, Err(McpError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_notification_handler_called_for_matching_method() {
        let (client, handle, _token) = wired_client();

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        client.on_notification("notifications/tools/list_changed", move |_params| {
            counter_clone.fetch_add(1, AtomicOrdering::SeqCst);
        });

        handle
            .inbound_tx
            .send(
                serde_json::to_string(&serde_json::json!({
                    "jsonrpc": "2.0",
                    "method": "notifications/tools/list_changed"
                }))
                .unwrap(),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reregistering_handler_replaces_previous() {
        let (client, handle, _token) = wired_client();

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_clone = Arc::clone(&first);
        client.on_notification("logging", move |_| {
            first_clone.fetch_add(1, AtomicOrdering::SeqCst);
        });
        let second_clone = Arc::clone(&second);
        client.on_notification("logging", move |_| {
            second_clone.fetch_add(1, AtomicOrdering::SeqCst);
        });

        handle
            .inbound_tx
            .send(
                serde_json::to_string(&serde_json::json!({
                    "jsonrpc": "2.0",
                    "method": "logging",
                    "params": { "level": 1, "message": "hi" }
                }))
                .unwrap(),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(first.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(second.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_panic_does_not_kill_dispatch() {
        let (client, handle, _token) = wired_client();

        client.on_notification("progress", |_| panic!("handler exploded"));
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        client.on_notification("logging", move |_| {
            counter_clone.fetch_add(1, AtomicOrdering::SeqCst);
        });

        for msg in [
            serde_json::json!({ "jsonrpc": "2.0", "method": "progress",
                "params": { "requestId": "op", "progress": 0.1 } }),
            serde_json::json!({ "jsonrpc": "2.0", "method": "logging",
                "params": { "level": 1, "message": "still alive" } }),
        ] {
            handle
                .inbound_tx
                .send(serde_json::to_string(&msg).unwrap())
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_originated_request_is_ignored() {
        let (client, mut handle, _token) = wired_client();

        // A request frame from the server must be ignored, not answered.
        handle
            .inbound_tx
            .send(
                serde_json::to_string(&serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": 99,
                    "method": "sampling/createMessage",
                    "params": {}
                }))
                .unwrap(),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(
            handle.outbound_rx.try_recv().is_err(),
            "no response must be sent for server-originated requests"
        );
        drop(client);
    }

    #[tokio::test]
    async fn test_parse_failure_does_not_stop_the_stream() {
        let (client, mut handle, _token) = wired_client();

        handle.inbound_tx.send("this is not json".to_string()).unwrap();

        tokio::spawn(async move {
            let sent = handle.outbound_rx.recv().await.unwrap();
            let req: serde_json::Value = serde_json::from_str(&sent).unwrap();
            handle
                .inbound_tx
                .send(
                    serde_json::to_string(&serde_json::json!({
                        "jsonrpc": "2.0",
                        "id": req["id"],
                        "result": {}
                    }))
                    .unwrap(),
                )
                .unwrap();
        });

        let result: Result<serde_json::Value> =
            client.request("ping", serde_json::json!({}), None).await;
        assert!(result.is_ok(), "stream must survive parse noise: {result:?}");
    }

    #[tokio::test]
    async fn test_notify_sends_without_id() {
        let (client, mut handle, _token) = wired_client();

        client
            .notify("notifications/initialized", serde_json::json!({}))
            .await
            .unwrap();

        let raw = handle.outbound_rx.recv().await.unwrap();
        let val: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(val["method"], "notifications/initialized");
        assert!(val.get("id").is_none(), "notifications must not have an id");
    }

    #[tokio::test]
    async fn test_multiple_concurrent_requests_resolved_correctly() {
        let (client, mut handle, _token) = wired_client();

        tokio::spawn(async move {
            // Answer requests out of order to prove correlation is by id.
            let mut reqs = Vec::new();
            for _ in 0..3 {
                let raw = handle.outbound_rx.recv().await.unwrap();
                let req: serde_json::Value = serde_json::from_str(&raw).unwrap();
                reqs.push(req);
            }
            reqs.reverse();
            for req in reqs {
                let resp = serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": req["id"],
                    "result": { "echo": req["id"] }
                });
                handle
                    .inbound_tx
                    .send(serde_json::to_string(&resp).unwrap())
                    .unwrap();
            }
        });

        let (r1, r2, r3) = tokio::join!(
            client.request::<_, serde_json::Value>("ping", serde_json::json!({}), None),
            client.request::<_, serde_json::Value>("ping", serde_json::json!({}), None),
            client.request::<_, serde_json::Value>("ping", serde_json::json!({}), None),
        );

        let ids: std::collections::HashSet<u64> = [r1.unwrap(), r2.unwrap(), r3.unwrap()]
            .into_iter()
            .map(|v| v["echo"].as_u64().unwrap())
            .collect();
        assert_eq!(ids.len(), 3, "each request should have a unique ID");
    }

    #[tokio::test]
    async fn test_send_failure_removes_pending_entry() {
        let (transport, handle) = FakeTransport::new();
        drop(handle); // close the fake's outbound channel
        let client = JsonRpcClient::new(Arc::new(transport), Duration::from_secs(1));

        let result: Result<serde_json::Value> =
            client.request("ping", serde_json::json!({}), None).await;
        assert!(result.is_err());
        assert!(client.pending.lock().is_empty(), "failed send must not leak");
    }
}
