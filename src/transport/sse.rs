//! HTTP+SSE transport for MCP
//!
//! This module implements [`SseTransport`], which splits the duplex channel
//! across two HTTP primitives:
//!
//! - **Inbound**: a persistent GET to the server URL with
//!   `Accept: text/event-stream`. The server pushes JSON-RPC messages as SSE
//!   frames.
//! - **Outbound**: HTTP POSTs to a *message endpoint*. The endpoint is not
//!   configured but discovered from the first SSE event of type `endpoint`,
//!   whose data is either an absolute URL or a path resolved against the GET
//!   URL. Discovery is bounded by a timeout; exceeding it aborts the
//!   connect.
//!
//! A `session_id` query parameter (a fresh UUID unless the caller supplied
//! one) identifies the session on the GET; POSTs carry it in the
//! `MCP-Session-Id` header.
//!
//! # Response handling
//!
//! A POST answered with 200 or 202 is accepted -- the actual RPC response
//! arrives via the event stream. 401 maps to
//! [`McpError::AuthRequired`], 404 to [`McpError::SessionTerminated`], and
//! any other non-success status to [`McpError::Transport`]. When a POST
//! response itself carries `Content-Type: text/event-stream`, its body is
//! parsed as a one-shot SSE stream and the messages are injected as if they
//! had arrived on the GET stream.
//!
//! # Concurrency and closure
//!
//! Concurrent POSTs are bounded by a FIFO-fair [`Semaphore`]; on close the
//! semaphore is closed so every waiter fails fast with
//! [`McpError::ConnectionClosed`]. Closure also cancels the SSE reader task
//! and, when `terminate_on_close` is set, DELETEs the session (a 405 from
//! servers that don't support termination is ignored).

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use tokio::sync::{mpsc, oneshot, Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::auth::TokenSource;
use crate::config::SseServerConfig;
use crate::error::{McpError, Result};
use crate::transport::Transport;

/// Header carrying the session id on POST and DELETE requests.
const HEADER_SESSION_ID: &str = "MCP-Session-Id";

/// Query parameter carrying the session id on the GET stream.
const QUERY_SESSION_ID: &str = "session_id";

/// HTTP+SSE transport implementing the split GET/POST channel.
///
/// # Examples
///
/// ```no_run
/// use url::Url;
/// use xzmcp::config::SseServerConfig;
/// use xzmcp::transport::sse::SseTransport;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let config = SseServerConfig::new(Url::parse("http://localhost:3000/sse")?);
/// let transport = SseTransport::connect(config).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SseTransport {
    /// Underlying reqwest HTTP client.
    http: reqwest::Client,
    /// Discovered POST target.
    message_endpoint: Url,
    /// Opaque session identifier shared by the GET stream and POSTs.
    session_id: String,
    /// Static extra headers merged into every request.
    headers: HashMap<String, String>,
    /// Optional bearer token source consulted before every POST.
    token_source: Option<Arc<dyn TokenSource>>,
    /// Per-POST deadline.
    request_timeout: Duration,
    /// FIFO-fair bound on concurrent POSTs.
    post_permits: Arc<Semaphore>,
    /// Sender for inbound JSON-RPC message strings (also used by inline
    /// POST-response streams).
    response_tx: mpsc::UnboundedSender<String>,
    /// Shared receiver exposed via `receive()`.
    response_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    /// Shared receiver exposed via `receive_err()`.
    error_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    /// Fires once, when the transport is permanently closed.
    shutdown: CancellationToken,
    /// Idle timeout applied to inline POST-response streams too.
    sse_read_timeout: Duration,
    /// Whether to DELETE the session on close.
    terminate_on_close: bool,
}

impl SseTransport {
    /// Open the event stream and discover the message endpoint.
    ///
    /// Issues the persistent GET, spawns the SSE reader task, and waits (up
    /// to `config.endpoint_timeout`) for the server's `endpoint` event. Only
    /// a successfully discovered endpoint yields a usable transport.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::AuthRequired`] when the GET is answered with 401,
    /// [`McpError::Transport`] for any other failure to establish the
    /// stream, and [`McpError::Transport`] when endpoint discovery times
    /// out.
    pub async fn connect(config: SseServerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| McpError::Transport(format!("failed to build HTTP client: {e}")))?;

        let mut server_url = config.server_url.clone();
        let session_id = ensure_session_id(&mut server_url);

        let mut req = http
            .get(server_url.clone())
            .header("Accept", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .header("Accept-Encoding", "identity");
        for (k, v) in &config.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        if let Some(source) = &config.token_source {
            if let Some(token) = source.bearer_token().await? {
                req = req.bearer_auth(token);
            }
        }

        let response = req
            .send()
            .await
            .map_err(|e| McpError::Transport(format!("SSE stream request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(McpError::AuthRequired(www_authenticate(&response)));
        }
        if !status.is_success() {
            return Err(McpError::Transport(format!(
                "SSE stream returned HTTP {status}"
            )));
        }

        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let (endpoint_tx, endpoint_rx) = oneshot::channel();
        let shutdown = CancellationToken::new();

        // The GET stream is the transport's lifeline: when it ends (remote
        // close, idle timeout, read error) the transport is closed.
        {
            let byte_stream = response.bytes_stream();
            let response_tx = response_tx.clone();
            let error_tx = error_tx.clone();
            let shutdown = shutdown.clone();
            let read_timeout = config.sse_read_timeout;
            tokio::spawn(async move {
                run_sse_reader(
                    byte_stream,
                    read_timeout,
                    response_tx,
                    error_tx,
                    Some(endpoint_tx),
                    shutdown.clone(),
                )
                .await;
                shutdown.cancel();
            });
        }

        let endpoint_data =
            match tokio::time::timeout(config.endpoint_timeout, endpoint_rx).await {
                Ok(Ok(data)) => data,
                Ok(Err(_)) => {
                    shutdown.cancel();
                    return Err(McpError::Transport(
                        "SSE stream ended before endpoint discovery".to_string(),
                    ));
                }
                Err(_) => {
                    shutdown.cancel();
                    return Err(McpError::Transport(format!(
                        "no endpoint event within {:?}",
                        config.endpoint_timeout
                    )));
                }
            };

        let message_endpoint = resolve_endpoint(&server_url, &endpoint_data)?;
        tracing::debug!("SSE message endpoint: {message_endpoint}");

        Ok(Self {
            http,
            message_endpoint,
            session_id,
            headers: config.headers,
            token_source: config.token_source,
            request_timeout: config.timeout,
            post_permits: Arc::new(Semaphore::new(config.max_concurrent_requests)),
            response_tx,
            response_rx: Arc::new(Mutex::new(response_rx)),
            error_rx: Arc::new(Mutex::new(error_rx)),
            shutdown,
            sse_read_timeout: config.sse_read_timeout,
            terminate_on_close: config.terminate_on_close,
        })
    }

    /// The session identifier in use (from the URL or freshly minted).
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The POST target discovered during connect.
    #[must_use]
    pub fn message_endpoint(&self) -> &Url {
        &self.message_endpoint
    }
}

#[async_trait::async_trait]
impl Transport for SseTransport {
    /// Deliver a JSON-RPC message via HTTP POST to the discovered endpoint.
    ///
    /// Acquires a semaphore permit first, so at most
    /// `max_concurrent_requests` POSTs are in flight; waiters are served in
    /// FIFO order and fail fast once the transport closes.
    async fn send(&self, message: String) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(McpError::ConnectionClosed);
        }
        let _permit = self
            .post_permits
            .acquire()
            .await
            .map_err(|_| McpError::ConnectionClosed)?;

        let mut req = self
            .http
            .post(self.message_endpoint.clone())
            .timeout(self.request_timeout)
            .header("Content-Type", "application/json")
            .header(HEADER_SESSION_ID, self.session_id.as_str());
        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        if let Some(source) = &self.token_source {
            if let Some(token) = source.bearer_token().await? {
                req = req.bearer_auth(token);
            }
        }

        let response = req
            .body(message)
            .send()
            .await
            .map_err(|e| McpError::Transport(format!("HTTP POST failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(McpError::AuthRequired(www_authenticate(&response)));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(McpError::SessionTerminated);
        }
        if status != StatusCode::OK && status != StatusCode::ACCEPTED {
            return Err(McpError::Transport(format!(
                "HTTP POST returned status {status}"
            )));
        }

        // 200/202 are both mere acknowledgements; the RPC response arrives
        // on the event stream. The exception is a POST response that itself
        // is an event stream: parse it inline and inject its messages.
        let content_type = response
            .headers()
            .get("Content-Type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains("text/event-stream") {
            let byte_stream = response.bytes_stream();
            let response_tx = self.response_tx.clone();
            let (error_tx, _) = mpsc::unbounded_channel();
            let shutdown = self.shutdown.clone();
            let read_timeout = self.sse_read_timeout;
            tokio::spawn(async move {
                // One-shot stream: its end does not close the transport.
                run_sse_reader(byte_stream, read_timeout, response_tx, error_tx, None, shutdown)
                    .await;
            });
        }

        Ok(())
    }

    /// Returns the stream of inbound JSON-RPC message strings, in the order
    /// received -- whether from the GET stream or inline POST responses.
    fn receive(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        let rx = Arc::clone(&self.response_rx);
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let mut guard = rx.lock().await;
            let item = guard.recv().await?;
            drop(guard);
            Some((item, rx))
        }))
    }

    /// Returns a stream of transport-level diagnostic strings (stream read
    /// errors, idle timeouts).
    fn receive_err(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        let rx = Arc::clone(&self.error_rx);
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let mut guard = rx.lock().await;
            let item = guard.recv().await?;
            drop(guard);
            Some((item, rx))
        }))
    }

    fn closed(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Close the transport: optionally DELETE the session, release every
    /// POST waiter, cancel the SSE reader. Idempotent.
    async fn close(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        if self.terminate_on_close {
            let mut req = self
                .http
                .delete(self.message_endpoint.clone())
                .timeout(Duration::from_secs(5))
                .header(HEADER_SESSION_ID, self.session_id.as_str());
            for (k, v) in &self.headers {
                req = req.header(k.as_str(), v.as_str());
            }
            match req.send().await {
                Ok(resp) if resp.status() == StatusCode::METHOD_NOT_ALLOWED => {
                    tracing::debug!("server does not support session DELETE; ignoring");
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("session DELETE failed: {e}"),
            }
        }
        self.post_permits.close();
        self.shutdown.cancel();
    }
}

impl Drop for SseTransport {
    /// Best-effort session termination when the transport is dropped without
    /// an explicit close.
    ///
    /// Spawns a plain thread with a blocking client because `drop` cannot
    /// await and must not block the async runtime.
    fn drop(&mut self) {
        let was_closed = self.shutdown.is_cancelled();
        self.post_permits.close();
        self.shutdown.cancel();

        if was_closed || !self.terminate_on_close {
            return;
        }

        let endpoint = self.message_endpoint.to_string();
        let session_id = self.session_id.clone();
        let headers = self.headers.clone();
        let _ = std::thread::spawn(move || {
            if let Ok(client) = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
            {
                let mut req = client.delete(&endpoint).header(HEADER_SESSION_ID, session_id);
                for (k, v) in &headers {
                    req = req.header(k.as_str(), v.as_str());
                }
                let _ = req.send();
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Ensure the GET URL carries a `session_id` query parameter, returning the
/// effective session id (the caller's when present, a fresh UUID otherwise).
fn ensure_session_id(server_url: &mut Url) -> String {
    let existing = server_url
        .query_pairs()
        .find(|(k, _)| k == QUERY_SESSION_ID)
        .map(|(_, v)| v.into_owned());
    match existing {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            server_url
                .query_pairs_mut()
                .append_pair(QUERY_SESSION_ID, &id);
            id
        }
    }
}

/// Resolve the endpoint event's data to the POST target URL.
///
/// Absolute URLs are taken verbatim; anything else is resolved against the
/// GET URL, which keeps its scheme/host/port while the data supplies
/// path+query.
fn resolve_endpoint(base: &Url, data: &str) -> Result<Url> {
    let data = data.trim();
    if let Ok(absolute) = Url::parse(data) {
        return Ok(absolute);
    }
    base.join(data)
        .map_err(|e| McpError::Transport(format!("invalid endpoint `{data}`: {e}")))
}

/// Extract the `WWW-Authenticate` challenge from a 401 response.
fn www_authenticate(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("WWW-Authenticate")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Pump one SSE byte stream through the parser, forwarding events.
///
/// Runs until the stream ends, a read errors, the idle timeout elapses, or
/// `shutdown` fires. The first `endpoint` event resolves `endpoint_tx` when
/// one is supplied (GET stream only); `message` events and unlabeled events
/// whose data looks like a JSON object are forwarded inbound; everything
/// else is logged and dropped.
async fn run_sse_reader<S>(
    byte_stream: S,
    read_timeout: Duration,
    response_tx: mpsc::UnboundedSender<String>,
    error_tx: mpsc::UnboundedSender<String>,
    mut endpoint_tx: Option<oneshot::Sender<String>>,
    shutdown: CancellationToken,
) where
    S: Stream<Item = reqwest::Result<Bytes>> + Send,
{
    let mut parser = SseParser::new();
    tokio::pin!(byte_stream);

    loop {
        let chunk = tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            next = tokio::time::timeout(read_timeout, byte_stream.next()) => match next {
                Err(_) => {
                    let _ = error_tx.send("SSE stream idle timeout".to_string());
                    break;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    let _ = error_tx.send(format!("SSE stream read error: {e}"));
                    break;
                }
                Ok(Some(Ok(chunk))) => chunk,
            }
        };

        for event in parser.push(&chunk) {
            deliver_event(event, &response_tx, &mut endpoint_tx);
        }
    }

    // Flush an unterminated trailing event, if the stream ended mid-block.
    if let Some(event) = parser.finish() {
        deliver_event(event, &response_tx, &mut endpoint_tx);
    }
}

/// Route one parsed SSE event.
fn deliver_event(
    event: SseEvent,
    response_tx: &mpsc::UnboundedSender<String>,
    endpoint_tx: &mut Option<oneshot::Sender<String>>,
) {
    match event.event.as_deref() {
        Some("endpoint") => {
            if let Some(tx) = endpoint_tx.take() {
                let _ = tx.send(event.data);
            } else {
                tracing::debug!("duplicate endpoint event ignored");
            }
        }
        Some("message") => {
            if !event.data.is_empty() {
                let _ = response_tx.send(event.data);
            }
        }
        None => {
            // Unlabeled frames are forwarded only when the data plausibly
            // carries a JSON-RPC object.
            if event.data.trim_start().starts_with('{') {
                let _ = response_tx.send(event.data);
            } else if !event.data.is_empty() {
                tracing::debug!("ignoring unlabeled SSE data: {}", event.data);
            }
        }
        Some(other) => {
            tracing::debug!("ignoring SSE event type `{other}`");
        }
    }
}

// ---------------------------------------------------------------------------
// SSE framing
// ---------------------------------------------------------------------------

/// One parsed SSE event block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseEvent {
    /// Value of the `event:` field, when present.
    pub event: Option<String>,
    /// Joined `data:` lines.
    pub data: String,
    /// Value of the `id:` field, when present.
    pub id: Option<String>,
}

/// Incremental SSE block parser.
///
/// Accumulates raw bytes and emits events only for complete blocks (those
/// terminated by a blank line, `\n\n` or `\r\n\r\n`); the trailing partial
/// block stays buffered across chunks. Decoding is UTF-8 with
/// malformed-sequence tolerance and happens per complete block, so a
/// multi-byte character split across chunk boundaries is never corrupted.
#[derive(Debug, Default)]
pub(crate) struct SseParser {
    buf: Vec<u8>,
}

impl SseParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every event completed by it, in order.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, sep_len)) = find_event_boundary(&self.buf) {
            let block: Vec<u8> = self.buf.drain(..end + sep_len).collect();
            let text = String::from_utf8_lossy(&block[..end]);
            if let Some(event) = parse_block(&text) {
                events.push(event);
            }
        }
        events
    }

    /// Flush the trailing partial block at end of stream.
    pub(crate) fn finish(&mut self) -> Option<SseEvent> {
        if self.buf.is_empty() {
            return None;
        }
        let block = std::mem::take(&mut self.buf);
        parse_block(&String::from_utf8_lossy(&block))
    }
}

/// Find the earliest block terminator, returning (offset, terminator length).
fn find_event_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = find_subslice(buf, b"\n\n");
    let crlf = find_subslice(buf, b"\r\n\r\n");
    match (lf, crlf) {
        (Some(l), Some(c)) => {
            if c < l {
                Some((c, 4))
            } else {
                Some((l, 2))
            }
        }
        (Some(l), None) => Some((l, 2)),
        (None, Some(c)) => Some((c, 4)),
        (None, None) => None,
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Parse the field lines of one complete block.
///
/// Recognizes `event:`, `data:` (multi-line values joined with `\n`), and
/// `id:`. Lines starting with `:` are comments; unknown fields are ignored.
/// Returns `None` when the block carries no recognized field.
fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event_type: Option<String> = None;
    let mut event_id: Option<String> = None;
    let mut data_lines: Vec<&str> = Vec::new();
    let mut saw_field = false;

    for line in block.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.trim());
            saw_field = true;
        } else if let Some(value) = line.strip_prefix("event:") {
            event_type = Some(value.trim().to_string());
            saw_field = true;
        } else if let Some(value) = line.strip_prefix("id:") {
            event_id = Some(value.trim().to_string());
            saw_field = true;
        }
    }

    if !saw_field {
        return None;
    }
    Some(SseEvent {
        event: event_type,
        data: data_lines.join("\n"),
        id: event_id,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
