//! Stdio transport for MCP child-process servers
//!
//! This module implements [`StdioTransport`], which spawns a child process
//! and communicates with it over its stdin/stdout pipes using
//! newline-delimited JSON framing. This is the standard transport for
//! locally-installed MCP servers.
//!
//! # Protocol
//!
//! - Outbound messages are written to the child's stdin as a single JSON
//!   object followed by a newline (`\n`). A single writer task drains a FIFO
//!   queue, flushing and yielding between messages, so partial writes never
//!   interleave and submission order is preserved.
//! - Inbound messages are read from the child's stdout, one JSON object per
//!   line; empty lines are skipped, everything else is forwarded verbatim
//!   (the session engine logs and drops lines that fail to parse).
//! - The child's stderr is forwarded to a diagnostic stream and logged via
//!   `tracing::debug!`. Stderr output MUST NOT be treated as an error
//!   condition.
//!
//! # Lifecycle
//!
//! The transport is created via [`StdioTransport::spawn`]. Closure is
//! triggered by an explicit [`Transport::close`] or by stdout end-of-stream
//! (which also covers child exit). On closure the child is killed
//! best-effort and the close signal fires. Dropping the transport sends a
//! best-effort SIGTERM (Unix) or `start_kill` (non-Unix) to the child.

use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use futures::Stream;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::StdioServerConfig;
use crate::error::{McpError, Result};
use crate::transport::Transport;

/// Stdio-based MCP transport that drives a child process.
///
/// Communication happens over the child's stdin (outbound) and stdout
/// (inbound) using newline-delimited JSON. The child's stderr is captured
/// and forwarded through [`Transport::receive_err`] as diagnostic-only
/// output.
///
/// # Examples
///
/// ```no_run
/// use xzmcp::config::StdioServerConfig;
/// use xzmcp::transport::stdio::StdioTransport;
///
/// # fn main() -> anyhow::Result<()> {
/// let config = StdioServerConfig::new("npx")
///     .with_arguments(["-y", "@modelcontextprotocol/server-filesystem", "/tmp"]);
/// let transport = StdioTransport::spawn(config)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StdioTransport {
    /// Sender side of the stdin queue; `send()` enqueues here.
    stdin_tx: mpsc::UnboundedSender<String>,
    /// Shared receiver for stdout lines (one JSON message per line).
    stdout_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    /// Shared receiver for stderr lines (diagnostics only).
    stderr_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    /// Handle to the spawned child process; used by close/`Drop`.
    child: Arc<Mutex<Child>>,
    /// Fires once, when the transport is permanently closed.
    shutdown: CancellationToken,
}

impl StdioTransport {
    /// Spawn a child process and wire up stdio pipes.
    ///
    /// The environment of the child is built by first clearing all inherited
    /// variables and then applying the configured `environment` map. If
    /// `working_directory` is set, the child starts there.
    ///
    /// Three background Tokio tasks are started immediately: a stdin writer
    /// draining the outbound FIFO, a stdout reader feeding the inbound
    /// channel (end-of-stream closes the transport), and a stderr reader
    /// feeding the diagnostic channel.
    ///
    /// # Arguments
    ///
    /// * `config` - Command, arguments, working directory, and environment
    ///   for the server process.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Transport`] if the process cannot be spawned or
    /// the stdio pipes are unavailable.
    pub fn spawn(config: StdioServerConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.arguments);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.env_clear().envs(&config.environment);
        if let Some(dir) = &config.working_directory {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            McpError::Transport(format!(
                "failed to spawn MCP server `{}`: {}",
                config.command.display(),
                e
            ))
        })?;

        // All three handles are Some because of Stdio::piped() above.
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Transport("child stdin unavailable after spawn".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Transport("child stdout unavailable after spawn".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| McpError::Transport("child stderr unavailable after spawn".into()))?;

        let shutdown = CancellationToken::new();

        let (stdin_tx, mut stdin_rx) = mpsc::unbounded_channel::<String>();
        let (stdout_tx, stdout_rx) = mpsc::unbounded_channel::<String>();
        let (stderr_tx, stderr_rx) = mpsc::unbounded_channel::<String>();

        // Background task: drain the outbound FIFO into child stdin, one line
        // at a time, yielding between writes so the pipe gets flushed.
        tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(msg) = stdin_rx.recv().await {
                let line = format!("{}\n", msg);
                if stdin.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
                tokio::task::yield_now().await;
            }
        });

        // Background task: drain child stdout -> stdout_tx. End-of-stream
        // means the child went away; close the transport.
        {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let reader = BufReader::new(stdout);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if stdout_tx.send(line).is_err() {
                        break;
                    }
                }
                shutdown.cancel();
            });
        }

        // Background task: drain child stderr -> stderr_tx + tracing log.
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(target: "xzmcp::transport::stdio", "mcp server stderr: {}", line);
                if stderr_tx.send(line).is_err() {
                    break;
                }
            }
        });

        let child = Arc::new(Mutex::new(child));

        // Supervisor: when the close signal fires, kill the child best-effort.
        {
            let shutdown = shutdown.clone();
            let child = Arc::clone(&child);
            tokio::spawn(async move {
                shutdown.cancelled().await;
                let mut guard = child.lock().await;
                let _ = guard.start_kill();
            });
        }

        Ok(Self {
            stdin_tx,
            stdout_rx: Arc::new(Mutex::new(stdout_rx)),
            stderr_rx: Arc::new(Mutex::new(stderr_rx)),
            child,
            shutdown,
        })
    }
}

#[async_trait::async_trait]
impl Transport for StdioTransport {
    /// Enqueue a JSON-RPC message for the child process.
    ///
    /// The message joins the FIFO queue; the single writer task appends a
    /// newline and writes it to the child's stdin.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::ConnectionClosed`] once the transport is closed
    /// and [`McpError::Transport`] if the writer task has exited.
    async fn send(&self, message: String) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(McpError::ConnectionClosed);
        }
        self.stdin_tx
            .send(message)
            .map_err(|e| McpError::Transport(format!("stdin queue closed: {}", e)))
    }

    /// Returns a stream of JSON-RPC messages received from the child's
    /// stdout (one complete JSON object per item).
    fn receive(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        let rx = Arc::clone(&self.stdout_rx);
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let mut guard = rx.lock().await;
            let item = guard.recv().await?;
            drop(guard);
            Some((item, rx))
        }))
    }

    /// Returns a stream of diagnostic lines from the child's stderr.
    fn receive_err(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        let rx = Arc::clone(&self.stderr_rx);
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

    /// Close the transport: fire the close signal, which kills the child
    /// best-effort via the supervisor task. Idempotent.
    async fn close(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for StdioTransport {
    /// Best-effort termination of the child process on drop.
    ///
    /// On Unix, sends SIGTERM to the child PID via `libc::kill`. On
    /// non-Unix platforms, calls `start_kill()` on the child handle. This
    /// method MUST NOT block.
    fn drop(&mut self) {
        self.shutdown.cancel();
        // Non-blocking lock attempt; if another task holds the child the
        // supervisor will still reap it.
        if let Ok(child) = self.child.try_lock() {
            #[cfg(unix)]
            {
                if let Some(pid) = child.id() {
                    // SAFETY: pid is a valid process ID obtained from tokio::process::Child.
                    unsafe {
                        libc::kill(pid as libc::pid_t, libc::SIGTERM);
                    }
                }
            }
            #[cfg(not(unix))]
            {
                let mut child = child;
                let _ = child.start_kill();
            }
        }
    }
}
