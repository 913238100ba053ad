//! Capability-gated MCP client facade
//!
//! This module provides [`McpClient`], the typed entry point of the crate.
//! A client is constructed cold from a [`ClientConfig`], connected to a
//! [`Transport`] via [`McpClient::connect`] (which performs the
//! `initialize` / `notifications/initialized` handshake), and then exposes
//! every MCP operation as a typed async method.
//!
//! # Capability gating
//!
//! The server's capability record is frozen at handshake time. Every typed
//! method asserts its capability before building a message, so a gated
//! violation fails with [`McpError::Client`] and never touches the wire:
//!
//! - tools methods require `tools`
//! - resource methods require `resources`
//! - prompt methods require `prompts`
//! - `create_message` requires `sampling`
//! - roots methods require the *client-declared* `roots` capability
//! - `health_check`, `set_logging_level`, and `cancel_operation` are ungated
//!
//! # Lifecycle
//!
//! `connect` refuses when a session is already attached, rolls back to the
//! disconnected state on any handshake failure, and only marks the client
//! initialized after the `notifications/initialized` notification has been
//! handed to the transport. `disconnect` completes every pending request
//! with [`McpError::ConnectionClosed`] and closes the transport. A lost
//! transport tears the session down the same way; there is no automatic
//! reconnection. All methods take `&self`, so a client can be shared behind
//! an `Arc` and disconnected while calls are in flight.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::client::{start_read_loop, JsonRpcClient};
use crate::config::ClientConfig;
use crate::error::{McpError, Result};
use crate::registry::ToolRegistry;
use crate::transport::Transport;
use crate::types::{
    CallToolResult, CreateMessageRequest, CreateMessageResult, GetPromptResult, Implementation,
    InitializeParams, InitializeResult, ListPromptsResult, ListResourceTemplatesResult,
    ListResourcesResult, ListRootsResult, ListToolsResult, LogMessage, McpLogLevel, ProgressUpdate,
    Prompt, ReadResourceResult, Resource, ResourceTemplate, ResourceUpdate, Root, SamplingResponse,
    ServerCapabilities, ServerHealth, Tool, ToolCallTracking, ToolMetadata, METHOD_CANCEL,
    METHOD_HEALTH_CHECK, METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_LOGGING_SET_LEVEL,
    METHOD_PROMPTS_GET, METHOD_PROMPTS_LIST, METHOD_RESOURCES_LIST, METHOD_RESOURCES_READ,
    METHOD_RESOURCES_SUBSCRIBE, METHOD_RESOURCES_TEMPLATES_LIST, METHOD_RESOURCES_UNSUBSCRIBE,
    METHOD_ROOTS_ADD, METHOD_ROOTS_LIST, METHOD_ROOTS_REMOVE, METHOD_SAMPLING_CREATE_MESSAGE,
    METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, NOTIF_LOGGING, NOTIF_PROGRESS,
    NOTIF_PROMPTS_LIST_CHANGED, NOTIF_RESOURCES_LIST_CHANGED, NOTIF_RESOURCES_UPDATED,
    NOTIF_ROOTS_LIST_CHANGED, NOTIF_SAMPLING_RESPONSE, NOTIF_TOOLS_LIST_CHANGED, PROTOCOL_VERSION,
};

/// A negotiated session: engine, teardown token, and the frozen handshake
/// snapshot.
#[derive(Debug)]
struct Session {
    rpc: Arc<JsonRpcClient>,
    cancellation: CancellationToken,
    server_info: Implementation,
    server_capabilities: ServerCapabilities,
    protocol_version: String,
}

/// Typed MCP client over a single transport.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use xzmcp::config::{ClientConfig, StdioServerConfig};
/// use xzmcp::transport::stdio::StdioTransport;
/// use xzmcp::McpClient;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let transport = StdioTransport::spawn(
///         StdioServerConfig::new("npx")
///             .with_arguments(["-y", "@modelcontextprotocol/server-filesystem", "/tmp"]),
///     )?;
///
///     let client = McpClient::new(ClientConfig::new("my-host", "1.0.0"));
///     client.connect(Arc::new(transport)).await?;
///
///     for tool in client.list_tools().await? {
///         println!("{}: {}", tool.name, tool.description);
///     }
///
///     client.disconnect().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct McpClient {
    config: ClientConfig,
    session: RwLock<Option<Arc<Session>>>,
}

impl McpClient {
    /// Create a disconnected client.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: RwLock::new(None),
        }
    }

    /// Whether a live transport is currently attached.
    ///
    /// Turns false again when the transport is lost, not only after an
    /// explicit [`McpClient::disconnect`].
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session
            .read()
            .as_ref()
            .is_some_and(|s| !s.rpc.transport().closed().is_cancelled())
    }

    /// Whether the handshake has completed on a live transport.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.is_connected()
    }

    /// The server identity reported during the handshake.
    #[must_use]
    pub fn server_info(&self) -> Option<Implementation> {
        self.session.read().as_ref().map(|s| s.server_info.clone())
    }

    /// The server capability record frozen at handshake time.
    #[must_use]
    pub fn server_capabilities(&self) -> Option<ServerCapabilities> {
        self.session.read().as_ref().map(|s| s.server_capabilities)
    }

    /// The protocol version the server selected.
    #[must_use]
    pub fn server_protocol_version(&self) -> Option<String> {
        self.session
            .read()
            .as_ref()
            .map(|s| s.protocol_version.clone())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Attach a transport and perform the MCP handshake.
    ///
    /// Wires the session engine onto the transport, sends `initialize`,
    /// verifies the advertised protocol version (advisory only -- a mismatch
    /// logs a warning), sends `notifications/initialized`, and freezes the
    /// server capability snapshot. On any failure the client rolls back to
    /// the disconnected state.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when already connected, and any engine or
    /// transport error raised during the handshake.
    pub async fn connect(&self, transport: Arc<dyn Transport>) -> Result<()> {
        if self.session.read().is_some() {
            return Err(McpError::Client("already connected".to_string()));
        }

        let cancellation = CancellationToken::new();
        let rpc = Arc::new(JsonRpcClient::new(transport, self.config.request_timeout));
        start_read_loop(Arc::clone(&rpc), cancellation.clone());

        let init = match self.handshake(&rpc).await {
            Ok(init) => init,
            Err(e) => {
                cancellation.cancel();
                return Err(e);
            }
        };

        tracing::debug!(
            "connected to MCP server {} v{}",
            init.server_info.name,
            init.server_info.version
        );

        let session = Arc::new(Session {
            rpc,
            cancellation,
            server_info: init.server_info,
            server_capabilities: init.capabilities,
            protocol_version: init.protocol_version,
        });

        let mut guard = self.session.write();
        if guard.is_some() {
            // A racing connect won; withdraw this one.
            session.cancellation.cancel();
            return Err(McpError::Client("already connected".to_string()));
        }
        *guard = Some(session);
        Ok(())
    }

    /// [`McpClient::connect`] with the configured bounded retry.
    ///
    /// Repeats the full handshake hook-up up to `max_attempts` times with a
    /// fixed delay between attempts; the final failure carries the last
    /// cause.
    ///
    /// # Errors
    ///
    /// Returns the last handshake error after the attempts are exhausted.
    pub async fn connect_with_retry(&self, transport: Arc<dyn Transport>) -> Result<()> {
        let retry = self.config.handshake_retry;
        let attempts = retry.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.connect(Arc::clone(&transport)).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!("handshake attempt {attempt}/{attempts} failed: {e}");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(retry.delay).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| McpError::Client("handshake retry exhausted".to_string())))
    }

    /// Tear the session down.
    ///
    /// Every pending request completes with [`McpError::ConnectionClosed`],
    /// the transport is closed, and the client returns to the disconnected
    /// state. Idempotent.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` keeps room for transports whose
    /// teardown can report failure.
    pub async fn disconnect(&self) -> Result<()> {
        let session = self.session.write().take();
        if let Some(session) = session {
            session.cancellation.cancel();
            session.rpc.fail_all_pending();
            session.rpc.transport().close().await;
        }
        Ok(())
    }

    async fn handshake(&self, rpc: &JsonRpcClient) -> Result<InitializeResult> {
        let init: InitializeResult = rpc
            .request(
                METHOD_INITIALIZE,
                InitializeParams {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: self.config.capabilities,
                    client_info: Implementation {
                        name: self.config.name.clone(),
                        version: self.config.version.clone(),
                    },
                },
                None,
            )
            .await?;

        check_protocol_version(&init.protocol_version);

        rpc.notify(METHOD_INITIALIZED, serde_json::json!({})).await?;

        Ok(init)
    }

    // -----------------------------------------------------------------------
    // Gating helpers
    // -----------------------------------------------------------------------

    fn session(&self) -> Result<Arc<Session>> {
        self.session
            .read()
            .clone()
            .ok_or_else(|| McpError::Client("client is not initialized".to_string()))
    }

    fn gated(
        &self,
        capability: &str,
        present: impl Fn(ServerCapabilities) -> bool,
    ) -> Result<Arc<Session>> {
        let session = self.session()?;
        if !present(session.server_capabilities) {
            return Err(McpError::Client(format!(
                "server does not advertise the {capability} capability"
            )));
        }
        Ok(session)
    }

    fn roots_session(&self) -> Result<Arc<Session>> {
        let session = self.session()?;
        if !self.config.capabilities.roots {
            return Err(McpError::Client(
                "client did not declare the roots capability".to_string(),
            ));
        }
        Ok(session)
    }

    // -----------------------------------------------------------------------
    // Tools
    // -----------------------------------------------------------------------

    /// List the tools exposed by the server.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when the server lacks the tools
    /// capability, plus any engine error.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let session = self.gated("tools", |caps| caps.tools)?;
        let result: ListToolsResult = session
            .rpc
            .request(METHOD_TOOLS_LIST, serde_json::json!({}), None)
            .await?;
        tracing::debug!("listed {} tools", result.tools.len());
        Ok(result.tools)
    }

    /// Invoke a named tool.
    ///
    /// # Arguments
    ///
    /// * `name` - The tool name as returned by `tools/list`.
    /// * `arguments` - JSON arguments matching the tool's input schema.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when the server lacks the tools
    /// capability, [`McpError::Remote`] when the server rejects the call,
    /// plus any engine error.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let session = self.gated("tools", |caps| caps.tools)?;
        session
            .rpc
            .request(
                METHOD_TOOLS_CALL,
                serde_json::json!({ "name": name, "arguments": arguments }),
                None,
            )
            .await
    }

    /// Invoke a named tool with progress tracking.
    ///
    /// Sends `trackProgress: true` and uses the longer tracking deadline
    /// from the config. When the server mints an operation id it is
    /// returned alongside the result, usable with
    /// [`McpClient::cancel_operation`] and correlated with `progress`
    /// notifications; servers that return none leave it absent.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`McpClient::call_tool`].
    pub async fn call_tool_with_tracking(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolCallTracking> {
        let session = self.gated("tools", |caps| caps.tools)?;
        let value: serde_json::Value = session
            .rpc
            .request(
                METHOD_TOOLS_CALL,
                serde_json::json!({
                    "name": name,
                    "arguments": arguments,
                    "trackProgress": true
                }),
                Some(self.config.tracking_timeout),
            )
            .await?;

        let operation_id = value
            .get("operationId")
            .and_then(|v| v.as_str())
            .map(String::from);
        let result: CallToolResult = serde_json::from_value(value)?;

        Ok(ToolCallTracking {
            operation_id,
            result,
        })
    }

    /// Issue `tools/list`, cache the full definitions in `registry`, and
    /// return the token-efficient metadata projection.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`McpClient::list_tools`].
    pub async fn list_tools_metadata(&self, registry: &ToolRegistry) -> Result<Vec<ToolMetadata>> {
        let tools = self.list_tools().await?;
        registry.cache_from_tools(tools);
        Ok(registry.get_all_metadata())
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    /// List the resources exposed by the server.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when the server lacks the resources
    /// capability, plus any engine error.
    pub async fn list_resources(&self) -> Result<Vec<Resource>> {
        let session = self.gated("resources", |caps| caps.resources)?;
        let result: ListResourcesResult = session
            .rpc
            .request(METHOD_RESOURCES_LIST, serde_json::json!({}), None)
            .await?;
        Ok(result.resources)
    }

    /// Read the contents of a resource by URI.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when the server lacks the resources
    /// capability, plus any engine error.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        let session = self.gated("resources", |caps| caps.resources)?;
        session
            .rpc
            .request(
                METHOD_RESOURCES_READ,
                serde_json::json!({ "uri": uri }),
                None,
            )
            .await
    }

    /// Read a templated resource.
    ///
    /// Substitutes each `{key}` placeholder in `template_uri` with the
    /// percent-encoded parameter value client-side, then delegates to
    /// `resources/read`.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`McpClient::read_resource`].
    pub async fn get_resource_with_template(
        &self,
        template_uri: &str,
        params: &HashMap<String, String>,
    ) -> Result<ReadResourceResult> {
        let uri = expand_uri_template(template_uri, params);
        self.read_resource(&uri).await
    }

    /// List the resource templates exposed by the server.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when the server lacks the resources
    /// capability, plus any engine error.
    pub async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>> {
        let session = self.gated("resources", |caps| caps.resources)?;
        let result: ListResourceTemplatesResult = session
            .rpc
            .request(METHOD_RESOURCES_TEMPLATES_LIST, serde_json::json!({}), None)
            .await?;
        Ok(result.resource_templates)
    }

    /// Subscribe to update notifications for a resource URI.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when the server lacks the resources
    /// capability, plus any engine error.
    pub async fn subscribe_resource(&self, uri: &str) -> Result<()> {
        let session = self.gated("resources", |caps| caps.resources)?;
        let _: serde_json::Value = session
            .rpc
            .request(
                METHOD_RESOURCES_SUBSCRIBE,
                serde_json::json!({ "uri": uri }),
                None,
            )
            .await?;
        Ok(())
    }

    /// Withdraw a resource subscription.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when the server lacks the resources
    /// capability, plus any engine error.
    pub async fn unsubscribe_resource(&self, uri: &str) -> Result<()> {
        let session = self.gated("resources", |caps| caps.resources)?;
        let _: serde_json::Value = session
            .rpc
            .request(
                METHOD_RESOURCES_UNSUBSCRIBE,
                serde_json::json!({ "uri": uri }),
                None,
            )
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Prompts
    // -----------------------------------------------------------------------

    /// List the prompts exposed by the server.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when the server lacks the prompts
    /// capability, plus any engine error.
    pub async fn list_prompts(&self) -> Result<Vec<Prompt>> {
        let session = self.gated("prompts", |caps| caps.prompts)?;
        let result: ListPromptsResult = session
            .rpc
            .request(METHOD_PROMPTS_LIST, serde_json::json!({}), None)
            .await?;
        Ok(result.prompts)
    }

    /// Retrieve a rendered prompt by name, substituting template arguments.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when the server lacks the prompts
    /// capability, plus any engine error.
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> Result<GetPromptResult> {
        let session = self.gated("prompts", |caps| caps.prompts)?;
        let mut params = serde_json::json!({ "name": name });
        if let Some(arguments) = arguments {
            params["arguments"] = serde_json::to_value(arguments)?;
        }
        session.rpc.request(METHOD_PROMPTS_GET, params, None).await
    }

    // -----------------------------------------------------------------------
    // Sampling
    // -----------------------------------------------------------------------

    /// Ask the server to generate a completion.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when the server lacks the sampling
    /// capability, plus any engine error.
    pub async fn create_message(
        &self,
        request: CreateMessageRequest,
    ) -> Result<CreateMessageResult> {
        let session = self.gated("sampling", |caps| caps.sampling)?;
        session
            .rpc
            .request(METHOD_SAMPLING_CREATE_MESSAGE, request, None)
            .await
    }

    // -----------------------------------------------------------------------
    // Roots
    // -----------------------------------------------------------------------

    /// Declare a filesystem root to the server.
    ///
    /// Emits `notifications/roots/list_changed` afterwards when the client
    /// declared `rootsListChanged`.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when this client did not declare the
    /// roots capability, plus any engine error.
    pub async fn add_root(&self, root: Root) -> Result<()> {
        let session = self.roots_session()?;
        let _: serde_json::Value = session
            .rpc
            .request(METHOD_ROOTS_ADD, serde_json::json!({ "root": root }), None)
            .await?;
        self.emit_roots_list_changed(&session).await;
        Ok(())
    }

    /// Withdraw a previously declared root by URI.
    ///
    /// Emits `notifications/roots/list_changed` afterwards when the client
    /// declared `rootsListChanged`.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when this client did not declare the
    /// roots capability, plus any engine error.
    pub async fn remove_root(&self, uri: &str) -> Result<()> {
        let session = self.roots_session()?;
        let _: serde_json::Value = session
            .rpc
            .request(METHOD_ROOTS_REMOVE, serde_json::json!({ "uri": uri }), None)
            .await?;
        self.emit_roots_list_changed(&session).await;
        Ok(())
    }

    /// List the roots currently known to the server.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when this client did not declare the
    /// roots capability, plus any engine error.
    pub async fn list_roots(&self) -> Result<Vec<Root>> {
        let session = self.roots_session()?;
        let result: ListRootsResult = session
            .rpc
            .request(METHOD_ROOTS_LIST, serde_json::json!({}), None)
            .await?;
        Ok(result.roots)
    }

    async fn emit_roots_list_changed(&self, session: &Session) {
        if !self.config.capabilities.roots_list_changed {
            return;
        }
        if let Err(e) = session
            .rpc
            .notify(NOTIF_ROOTS_LIST_CHANGED, serde_json::json!({}))
            .await
        {
            tracing::warn!("failed to emit roots list_changed: {e}");
        }
    }

    // -----------------------------------------------------------------------
    // Logging, health, cancellation
    // -----------------------------------------------------------------------

    /// Set the server-side logging verbosity.
    ///
    /// # Errors
    ///
    /// Returns any engine error.
    pub async fn set_logging_level(&self, level: McpLogLevel) -> Result<()> {
        let session = self.session()?;
        let _: serde_json::Value = session
            .rpc
            .request(
                METHOD_LOGGING_SET_LEVEL,
                serde_json::json!({ "level": level.index() }),
                None,
            )
            .await?;
        Ok(())
    }

    /// Query the server's health snapshot.
    ///
    /// # Errors
    ///
    /// Returns any engine error.
    pub async fn health_check(&self) -> Result<ServerHealth> {
        let session = self.session()?;
        session
            .rpc
            .request(METHOD_HEALTH_CHECK, serde_json::json!({}), None)
            .await
    }

    /// Request cancellation of a server-side operation.
    ///
    /// Cancellation is advisory: the original `tools/call` still completes
    /// through the server's response or its own timeout.
    ///
    /// # Errors
    ///
    /// Returns any engine error.
    pub async fn cancel_operation(&self, operation_id: &str) -> Result<()> {
        let session = self.session()?;
        let _: serde_json::Value = session
            .rpc
            .request(METHOD_CANCEL, serde_json::json!({ "id": operation_id }), None)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Notification callbacks
    // -----------------------------------------------------------------------

    /// Register a callback for `notifications/tools/list_changed`.
    ///
    /// One handler per notification; re-registering replaces the previous
    /// one. Handlers run on the dispatch task and must not block.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when not connected.
    pub fn on_tools_list_changed(&self, f: impl Fn() + Send + Sync + 'static) -> Result<()> {
        self.register_unit(NOTIF_TOOLS_LIST_CHANGED, f)
    }

    /// Register a callback for `notifications/resources/list_changed`.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when not connected.
    pub fn on_resources_list_changed(&self, f: impl Fn() + Send + Sync + 'static) -> Result<()> {
        self.register_unit(NOTIF_RESOURCES_LIST_CHANGED, f)
    }

    /// Register a callback for `notifications/prompts/list_changed`.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when not connected.
    pub fn on_prompts_list_changed(&self, f: impl Fn() + Send + Sync + 'static) -> Result<()> {
        self.register_unit(NOTIF_PROMPTS_LIST_CHANGED, f)
    }

    /// Register a callback for `notifications/roots/list_changed`.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when not connected.
    pub fn on_roots_list_changed(&self, f: impl Fn() + Send + Sync + 'static) -> Result<()> {
        self.register_unit(NOTIF_ROOTS_LIST_CHANGED, f)
    }

    /// Register a callback for `notifications/resources/updated`.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when not connected.
    pub fn on_resource_updated(
        &self,
        f: impl Fn(ResourceUpdate) + Send + Sync + 'static,
    ) -> Result<()> {
        self.register_typed(NOTIF_RESOURCES_UPDATED, f)
    }

    /// Register a callback for `progress` notifications.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when not connected.
    pub fn on_progress(&self, f: impl Fn(ProgressUpdate) + Send + Sync + 'static) -> Result<()> {
        self.register_typed(NOTIF_PROGRESS, f)
    }

    /// Register a callback for `sampling/response` notifications.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when not connected.
    pub fn on_sampling_response(
        &self,
        f: impl Fn(SamplingResponse) + Send + Sync + 'static,
    ) -> Result<()> {
        self.register_typed(NOTIF_SAMPLING_RESPONSE, f)
    }

    /// Register a callback for `logging` notifications.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Client`] when not connected.
    pub fn on_log_message(&self, f: impl Fn(LogMessage) + Send + Sync + 'static) -> Result<()> {
        self.register_typed(NOTIF_LOGGING, f)
    }

    fn register_unit(
        &self,
        method: &'static str,
        f: impl Fn() + Send + Sync + 'static,
    ) -> Result<()> {
        let session = self.session()?;
        session.rpc.on_notification(method, move |_params| f());
        Ok(())
    }

    fn register_typed<T, F>(&self, method: &'static str, f: F) -> Result<()>
    where
        T: serde::de::DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let session = self.session()?;
        session
            .rpc
            .on_notification(method, move |params| match serde_json::from_value::<T>(params) {
                Ok(payload) => f(payload),
                Err(e) => tracing::warn!("malformed {method} notification: {e}"),
            });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Advisory protocol version check: never fatal, only a warning.
fn check_protocol_version(server_version: &str) {
    if server_version == PROTOCOL_VERSION {
        return;
    }
    let format = "%Y-%m-%d";
    let ours = chrono::NaiveDate::parse_from_str(PROTOCOL_VERSION, format);
    let theirs = chrono::NaiveDate::parse_from_str(server_version, format);
    match (ours, theirs) {
        (Ok(ours), Ok(theirs)) if theirs > ours => tracing::warn!(
            "server speaks MCP revision {server_version}, newer than supported {PROTOCOL_VERSION}; proceeding"
        ),
        (Ok(ours), Ok(theirs)) if theirs < ours => tracing::warn!(
            "server speaks MCP revision {server_version}, older than supported {PROTOCOL_VERSION}; proceeding"
        ),
        _ => tracing::warn!(
            "server protocol version {server_version} differs from supported {PROTOCOL_VERSION}"
        ),
    }
}

/// Substitute `{key}` placeholders with percent-encoded values.
fn expand_uri_template(template: &str, params: &HashMap<String, String>) -> String {
    let mut uri = template.to_string();
    for (key, value) in params {
        uri = uri.replace(&format!("{{{key}}}"), &percent_encode(value));
    }
    uri
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
