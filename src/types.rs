//! MCP protocol types and JSON-RPC 2.0 primitives
//!
//! This module defines every wire type used by the Model Context Protocol
//! revision **2024-11-05**. All types derive `Debug`, `Clone`, `Serialize`,
//! and `Deserialize` unless noted otherwise. Struct fields are `camelCase` on
//! the wire via `#[serde(rename_all = "camelCase")]` unless the field is
//! already camelCase, and all `Option<>` fields omit their key from JSON when
//! `None` via `#[serde(skip_serializing_if = "Option::is_none")]`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol constants
// ---------------------------------------------------------------------------

/// The MCP protocol revision this client speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// The JSON-RPC protocol tag carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

// ---------------------------------------------------------------------------
// JSON-RPC method constants
// ---------------------------------------------------------------------------

/// Lifecycle: client sends `initialize` to open a session.
pub const METHOD_INITIALIZE: &str = "initialize";
/// Lifecycle: client sends `notifications/initialized` after the server ACKs.
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
/// Request the list of available tools.
pub const METHOD_TOOLS_LIST: &str = "tools/list";
/// Invoke a named tool.
pub const METHOD_TOOLS_CALL: &str = "tools/call";
/// Request the list of available resources.
pub const METHOD_RESOURCES_LIST: &str = "resources/list";
/// Read the contents of a resource by URI.
pub const METHOD_RESOURCES_READ: &str = "resources/read";
/// List URI templates for parameterized resources.
pub const METHOD_RESOURCES_TEMPLATES_LIST: &str = "resources/templates/list";
/// Subscribe to live updates for a resource URI.
pub const METHOD_RESOURCES_SUBSCRIBE: &str = "resources/subscribe";
/// Unsubscribe from a resource URI.
pub const METHOD_RESOURCES_UNSUBSCRIBE: &str = "resources/unsubscribe";
/// Request the list of available prompts.
pub const METHOD_PROMPTS_LIST: &str = "prompts/list";
/// Retrieve a rendered prompt by name.
pub const METHOD_PROMPTS_GET: &str = "prompts/get";
/// Ask the server to generate a completion sample.
pub const METHOD_SAMPLING_CREATE_MESSAGE: &str = "sampling/createMessage";
/// Declare a filesystem root to the server.
pub const METHOD_ROOTS_ADD: &str = "roots/add";
/// Withdraw a previously declared root.
pub const METHOD_ROOTS_REMOVE: &str = "roots/remove";
/// List the roots known to the server.
pub const METHOD_ROOTS_LIST: &str = "roots/list";
/// Set the server-side logging verbosity level.
pub const METHOD_LOGGING_SET_LEVEL: &str = "logging/set_level";
/// Query the server's health snapshot.
pub const METHOD_HEALTH_CHECK: &str = "health/check";
/// Request cancellation of a server-side operation.
pub const METHOD_CANCEL: &str = "cancel";

// ---------------------------------------------------------------------------
// Notification constants
// ---------------------------------------------------------------------------

/// Server notifies that the tool list has changed.
pub const NOTIF_TOOLS_LIST_CHANGED: &str = "notifications/tools/list_changed";
/// Server notifies that the resource list has changed.
pub const NOTIF_RESOURCES_LIST_CHANGED: &str = "notifications/resources/list_changed";
/// Server notifies that the prompt list has changed.
pub const NOTIF_PROMPTS_LIST_CHANGED: &str = "notifications/prompts/list_changed";
/// Either side notifies that the root list has changed.
pub const NOTIF_ROOTS_LIST_CHANGED: &str = "notifications/roots/list_changed";
/// Server notifies that a subscribed resource's content has been updated.
pub const NOTIF_RESOURCES_UPDATED: &str = "notifications/resources/updated";
/// Server reports progress on a long-running operation.
pub const NOTIF_PROGRESS: &str = "progress";
/// Server delivers an out-of-band sampling result.
pub const NOTIF_SAMPLING_RESPONSE: &str = "sampling/response";
/// Server emits a log message.
pub const NOTIF_LOGGING: &str = "logging";

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 wire types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request object.
///
/// `jsonrpc` MUST always be `"2.0"`. Request ids are client-local monotonic
/// integers starting at 1; notifications use [`JsonRpcNotification`] and
/// carry no id at all.
///
/// # Examples
///
/// ```
/// use xzmcp::types::JsonRpcRequest;
///
/// let req = JsonRpcRequest {
///     jsonrpc: "2.0".to_string(),
///     id: 1,
///     method: "tools/list".to_string(),
///     params: Some(serde_json::json!({})),
/// };
/// assert_eq!(req.jsonrpc, "2.0");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// Request correlation identifier.
    pub id: u64,
    /// The method name to invoke.
    pub method: String,
    /// Optional method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// A JSON-RPC 2.0 response object.
///
/// Exactly one of `result` or `error` is present in a valid response. The
/// `id` mirrors the request and may in principle be any JSON value, so it is
/// kept loosely typed here; the session engine narrows it to `u64`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// Mirrors the `id` from the corresponding request.
    pub id: serde_json::Value,
    /// Successful result value; mutually exclusive with `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error object; mutually exclusive with `result`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
///
/// Implements `Display` as `"JSON-RPC error {code}: {message}"`.
///
/// # Examples
///
/// ```
/// use xzmcp::types::JsonRpcError;
///
/// let e = JsonRpcError { code: -32600, message: "Invalid Request".to_string(), data: None };
/// assert_eq!(e.to_string(), "JSON-RPC error -32600: Invalid Request");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Numeric error code as defined by JSON-RPC 2.0 or the MCP spec.
    pub code: i64,
    /// Human-readable error description.
    pub message: String,
    /// Optional additional error context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// A JSON-RPC 2.0 notification (a request with no `id`).
///
/// # Examples
///
/// ```
/// use xzmcp::types::JsonRpcNotification;
///
/// let n = JsonRpcNotification {
///     jsonrpc: "2.0".to_string(),
///     method: "notifications/initialized".to_string(),
///     params: None,
/// };
/// assert_eq!(n.method, "notifications/initialized");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcNotification {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// The notification method name.
    pub method: String,
    /// Optional notification parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// Any JSON-RPC message: request, response, or notification.
///
/// The classification is derived from field shape, not transmitted: a
/// request carries `id` and `method`, a response carries `id` with `result`
/// or `error`, a notification carries `method` only. Variant order matters
/// for the untagged deserializer and must stay request, response,
/// notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// A request message (client-originated in this core).
    Request(JsonRpcRequest),
    /// A response message.
    Response(JsonRpcResponse),
    /// A notification message.
    Notification(JsonRpcNotification),
}

impl JsonRpcMessage {
    /// Try to view this message as a response.
    #[must_use]
    pub fn as_response(&self) -> Option<&JsonRpcResponse> {
        match self {
            Self::Response(res) => Some(res),
            _ => None,
        }
    }

    /// Try to view this message as a notification.
    #[must_use]
    pub fn as_notification(&self) -> Option<&JsonRpcNotification> {
        match self {
            Self::Notification(notif) => Some(notif),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Identity and capability types
// ---------------------------------------------------------------------------

/// Identifies a client or server implementation by name and version.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    /// Short name of the implementation (e.g. `"xzmcp"`).
    pub name: String,
    /// Version string (e.g. `"0.2.0"`).
    pub version: String,
}

/// Capabilities a client declares to the server.
///
/// The record is a fixed set of booleans; on the wire it encodes to the
/// nested MCP shape, e.g. `{"roots":{"listChanged":true},"sampling":{}}`.
///
/// # Examples
///
/// ```
/// use xzmcp::types::ClientCapabilities;
///
/// let caps = ClientCapabilities { roots: true, roots_list_changed: true, sampling: false };
/// let json = serde_json::to_value(&caps).unwrap();
/// assert_eq!(json, serde_json::json!({ "roots": { "listChanged": true } }));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ClientCapabilitiesWire", into = "ClientCapabilitiesWire")]
pub struct ClientCapabilities {
    /// Client can declare filesystem roots.
    pub roots: bool,
    /// Client emits `notifications/roots/list_changed` on root mutations.
    pub roots_list_changed: bool,
    /// Client can participate in sampling.
    pub sampling: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientCapabilitiesWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    roots: Option<FeatureCapabilityWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sampling: Option<serde_json::Value>,
}

impl From<ClientCapabilitiesWire> for ClientCapabilities {
    fn from(wire: ClientCapabilitiesWire) -> Self {
        Self {
            roots: wire.roots.is_some(),
            roots_list_changed: wire
                .roots
                .and_then(|r| r.list_changed)
                .unwrap_or(false),
            sampling: wire.sampling.is_some(),
        }
    }
}

impl From<ClientCapabilities> for ClientCapabilitiesWire {
    fn from(caps: ClientCapabilities) -> Self {
        Self {
            roots: caps.roots.then(|| FeatureCapabilityWire {
                list_changed: caps.roots_list_changed.then_some(true),
            }),
            sampling: caps.sampling.then(|| serde_json::json!({})),
        }
    }
}

/// Capabilities a server declares during the handshake.
///
/// Decoded from the nested wire shape `{"tools":{"listChanged":bool},...}`:
/// presence of the outer key implies the feature; the inner flag defaults to
/// `false`. Frozen for the lifetime of the connection once negotiated.
///
/// # Examples
///
/// ```
/// use xzmcp::types::ServerCapabilities;
///
/// let caps: ServerCapabilities = serde_json::from_value(serde_json::json!({
///     "tools": { "listChanged": true },
///     "resources": {}
/// })).unwrap();
/// assert!(caps.tools && caps.tools_list_changed);
/// assert!(caps.resources && !caps.resources_list_changed);
/// assert!(!caps.prompts);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ServerCapabilitiesWire", into = "ServerCapabilitiesWire")]
pub struct ServerCapabilities {
    /// Server exposes tools via `tools/list` and `tools/call`.
    pub tools: bool,
    /// Server emits `notifications/tools/list_changed`.
    pub tools_list_changed: bool,
    /// Server exposes resources via `resources/list` and `resources/read`.
    pub resources: bool,
    /// Server emits `notifications/resources/list_changed`.
    pub resources_list_changed: bool,
    /// Server exposes prompts via `prompts/list` and `prompts/get`.
    pub prompts: bool,
    /// Server emits `notifications/prompts/list_changed`.
    pub prompts_list_changed: bool,
    /// Server accepts `sampling/createMessage`.
    pub sampling: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerCapabilitiesWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<FeatureCapabilityWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<FeatureCapabilityWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompts: Option<FeatureCapabilityWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sampling: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureCapabilityWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    list_changed: Option<bool>,
}

impl From<ServerCapabilitiesWire> for ServerCapabilities {
    fn from(wire: ServerCapabilitiesWire) -> Self {
        let flag = |f: &Option<FeatureCapabilityWire>| {
            f.as_ref().and_then(|c| c.list_changed).unwrap_or(false)
        };
        Self {
            tools: wire.tools.is_some(),
            tools_list_changed: flag(&wire.tools),
            resources: wire.resources.is_some(),
            resources_list_changed: flag(&wire.resources),
            prompts: wire.prompts.is_some(),
            prompts_list_changed: flag(&wire.prompts),
            sampling: wire.sampling.is_some(),
        }
    }
}

impl From<ServerCapabilities> for ServerCapabilitiesWire {
    fn from(caps: ServerCapabilities) -> Self {
        let feature = |present: bool, list_changed: bool| {
            present.then(|| FeatureCapabilityWire {
                list_changed: list_changed.then_some(true),
            })
        };
        Self {
            tools: feature(caps.tools, caps.tools_list_changed),
            resources: feature(caps.resources, caps.resources_list_changed),
            prompts: feature(caps.prompts, caps.prompts_list_changed),
            sampling: caps.sampling.then(|| serde_json::json!({})),
        }
    }
}

// ---------------------------------------------------------------------------
// Initialize types
// ---------------------------------------------------------------------------

/// Parameters sent by the client in the `initialize` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// The protocol version the client wishes to use.
    pub protocol_version: String,
    /// Capabilities advertised by this client.
    pub capabilities: ClientCapabilities,
    /// Information identifying this client implementation.
    pub client_info: Implementation,
}

/// Response returned by the server to an `initialize` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// The protocol version the server has selected for this session.
    pub protocol_version: String,
    /// Capabilities advertised by this server.
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    /// Information identifying this server implementation.
    pub server_info: Implementation,
}

// ---------------------------------------------------------------------------
// Tool types
// ---------------------------------------------------------------------------

/// A tool exposed by an MCP server.
///
/// # Examples
///
/// ```
/// use xzmcp::types::Tool;
///
/// let tool: Tool = serde_json::from_value(serde_json::json!({
///     "name": "search",
///     "description": "Search the web",
///     "inputSchema": { "type": "object" }
/// })).unwrap();
/// assert_eq!(tool.name, "search");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Unique name of the tool within the server.
    pub name: String,
    /// Human-readable description of the tool's purpose.
    #[serde(default)]
    pub description: String,
    /// JSON Schema describing the tool's input parameters.
    pub input_schema: serde_json::Value,
    /// Whether the tool emits `progress` notifications while running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_progress: Option<bool>,
    /// Whether a running invocation can be cancelled via `cancel`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_cancellation: Option<bool>,
    /// Server-defined extension metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Token-efficient projection of a [`Tool`]: name and description only.
///
/// Its encoding is strictly smaller than the full tool encoding, which is
/// the point: listings that only need identity stay cheap, and the full
/// schema is fetched from a [`crate::registry::ToolRegistry`] on demand.
///
/// # Examples
///
/// ```
/// use xzmcp::types::{Tool, ToolMetadata};
///
/// let tool: Tool = serde_json::from_value(serde_json::json!({
///     "name": "search", "description": "Search the web", "inputSchema": {}
/// })).unwrap();
/// let meta = ToolMetadata::from(&tool);
/// assert_eq!(meta.name, "search");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolMetadata {
    /// Unique name of the tool within the server.
    pub name: String,
    /// Human-readable description of the tool's purpose.
    #[serde(default)]
    pub description: String,
}

impl From<&Tool> for ToolMetadata {
    fn from(tool: &Tool) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
        }
    }
}

/// Response to a `tools/list` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// The tools currently exposed by the server.
    pub tools: Vec<Tool>,
}

/// Result of a `tools/call` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// The content items produced by the tool.
    pub content: Vec<Content>,
    /// Whether further content will arrive out of band.
    #[serde(default)]
    pub is_streaming: bool,
    /// When `true`, the tool signalled an error condition within its content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// A tracked tool invocation: the call result plus the server-side operation
/// id, when the server minted one.
///
/// The operation id is an opaque server string usable with
/// [`crate::McpClient::cancel_operation`]. Servers that do not return one
/// leave it absent; the client never synthesizes an id.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallTracking {
    /// Opaque server-side operation id, when provided.
    pub operation_id: Option<String>,
    /// The tool call result.
    pub result: CallToolResult,
}

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

/// A content item, discriminated by the `"type"` field on the wire.
///
/// Decoding an unknown tag fails; it never silently becomes a default
/// variant.
///
/// # Examples
///
/// ```
/// use xzmcp::types::Content;
///
/// let c = Content::Text { text: "hello".to_string() };
/// let json = serde_json::to_value(&c).unwrap();
/// assert_eq!(json["type"], "text");
/// assert!(serde_json::from_value::<Content>(serde_json::json!({ "type": "video" })).is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Plain text output.
    Text {
        /// The text content.
        text: String,
    },
    /// An image, carried by URL or as base64 data.
    Image {
        /// URL of the image, when referenced rather than embedded.
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        /// Base64-encoded image bytes, when embedded.
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<String>,
        /// MIME type of the image (e.g. `"image/png"`).
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// A reference to (or inline copy of) a resource.
    Resource {
        /// Canonical URI of the resource.
        uri: String,
        /// Inline text contents, if present.
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        /// Inline base64 binary contents, if present.
        #[serde(skip_serializing_if = "Option::is_none")]
        blob: Option<String>,
        /// MIME type, if known.
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// Metadata describing a resource exposed by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Canonical URI for this resource.
    pub uri: String,
    /// Human-readable resource name.
    pub name: String,
    /// Description of the resource.
    #[serde(default)]
    pub description: String,
    /// MIME type, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// URI template this resource was minted from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri_template: Option<String>,
}

/// A URI template for parameterized resource access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    /// URI template string with `{key}` placeholders.
    pub uri_template: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the template.
    #[serde(default)]
    pub description: String,
    /// MIME type of resources matched by this template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// One content object inside a `resources/read` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContentInfo {
    /// Canonical URI that identifies this resource.
    pub uri: String,
    /// MIME type, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// UTF-8 text contents, when textual.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64-encoded binary contents, when binary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

/// Response to a `resources/read` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadResourceResult {
    /// One or more content objects representing the resource's current state.
    pub contents: Vec<ResourceContentInfo>,
}

/// Response to a `resources/list` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResourcesResult {
    /// The resources currently exposed by the server.
    pub resources: Vec<Resource>,
}

/// Response to a `resources/templates/list` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourceTemplatesResult {
    /// The resource templates currently exposed by the server.
    pub resource_templates: Vec<ResourceTemplate>,
}

// ---------------------------------------------------------------------------
// Prompt types
// ---------------------------------------------------------------------------

/// Conversation participant role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message from the human user.
    User,
    /// A message from the AI assistant.
    Assistant,
}

/// Describes a single argument accepted by a prompt template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptArgument {
    /// Argument name (used as a key when calling `prompts/get`).
    pub name: String,
    /// Human-readable description of what this argument controls.
    #[serde(default)]
    pub description: String,
    /// When `true`, this argument must be supplied by the caller.
    #[serde(default)]
    pub required: bool,
    /// Default value applied when the argument is omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

/// Metadata describing a prompt template exposed by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    /// Unique name of this prompt.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Argument descriptors for this template.
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

/// A single message in a prompt conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptMessage {
    /// Who authored this message.
    pub role: Role,
    /// The message body.
    pub content: Content,
}

/// Response to a `prompts/list` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPromptsResult {
    /// The prompts currently exposed by the server.
    pub prompts: Vec<Prompt>,
}

/// Response to a `prompts/get` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetPromptResult {
    /// Human-readable description of what this prompt does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The rendered prompt messages ready to send to an LLM.
    pub messages: Vec<PromptMessage>,
}

// ---------------------------------------------------------------------------
// Sampling types
// ---------------------------------------------------------------------------

/// A hint suggesting which model to prefer for a sampling request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelHint {
    /// Model name or prefix to prefer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Weighted preferences for model selection in a sampling request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelPreferences {
    /// Ordered list of model hints from most to least preferred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<ModelHint>>,
    /// Priority weight for minimizing cost (0.0-1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_priority: Option<f64>,
    /// Priority weight for minimizing latency (0.0-1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_priority: Option<f64>,
    /// Priority weight for maximizing quality (0.0-1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intelligence_priority: Option<f64>,
}

/// Parameters for a `sampling/createMessage` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    /// The conversation history to complete.
    pub messages: Vec<PromptMessage>,
    /// Model selection preferences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_preferences: Option<ModelPreferences>,
    /// Optional system prompt to prepend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// What conversational context to include.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_context: Option<String>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Optional stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Provider-specific metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Result of a `sampling/createMessage` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageResult {
    /// The model that produced this result.
    pub model: String,
    /// Why generation stopped (e.g. `"end_turn"`, `"max_tokens"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// Role of the generated message.
    pub role: Role,
    /// The generated content.
    pub content: Content,
}

// ---------------------------------------------------------------------------
// Roots, logging, health
// ---------------------------------------------------------------------------

/// A filesystem root declared by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Root {
    /// URI of the root (e.g. `"file:///home/user/project"`).
    pub uri: String,
    /// Display name for the root.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response to a `roots/list` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRootsResult {
    /// The roots currently known to the server.
    pub roots: Vec<Root>,
}

/// Syslog-inspired severity levels for MCP log messages.
///
/// The wire carries the level as its integer index (0 = debug).
///
/// # Examples
///
/// ```
/// use xzmcp::types::McpLogLevel;
///
/// assert_eq!(McpLogLevel::Warning.index(), 3);
/// assert_eq!(McpLogLevel::from_index(3), Some(McpLogLevel::Warning));
/// assert_eq!(McpLogLevel::from_index(99), None);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum McpLogLevel {
    /// Verbose diagnostic information.
    Debug,
    /// General operational information.
    Info,
    /// Normal but significant events.
    Notice,
    /// Potential problems that don't prevent operation.
    Warning,
    /// Error conditions that affect a specific operation.
    Error,
    /// Severe conditions that affect broad functionality.
    Critical,
    /// Immediate action required.
    Alert,
    /// System is unusable.
    Emergency,
}

impl McpLogLevel {
    const ALL: [McpLogLevel; 8] = [
        Self::Debug,
        Self::Info,
        Self::Notice,
        Self::Warning,
        Self::Error,
        Self::Critical,
        Self::Alert,
        Self::Emergency,
    ];

    /// The integer index of this level as carried on the wire.
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Resolve a wire index back to a level; `None` when out of range.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }
}

/// Server health snapshot returned by `health/check`.
///
/// The wire carries `uptimeSeconds`; [`ServerHealth::uptime`] exposes it as a
/// [`Duration`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerHealth {
    /// Whether the server considers itself operational.
    pub is_running: bool,
    /// Number of client sessions currently connected.
    pub connected_sessions: u64,
    /// Number of tools registered on the server.
    pub registered_tools: u64,
    /// Number of resources registered on the server.
    pub registered_resources: u64,
    /// Number of prompts registered on the server.
    pub registered_prompts: u64,
    /// ISO 8601 timestamp of when the server started.
    pub start_time: String,
    /// Seconds since the server started.
    pub uptime_seconds: f64,
    /// Server-defined metrics blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Value>,
}

impl ServerHealth {
    /// Uptime as a [`Duration`], derived from `uptimeSeconds`.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        Duration::from_secs_f64(self.uptime_seconds.max(0.0))
    }
}

// ---------------------------------------------------------------------------
// Notification payloads
// ---------------------------------------------------------------------------

/// Payload of a `notifications/resources/updated` notification.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUpdate {
    /// URI of the resource that changed.
    pub uri: String,
    /// Updated contents, when the server pushes them inline.
    #[serde(default)]
    pub content: Option<ResourceContentInfo>,
}

/// Payload of a `progress` notification.
///
/// Accepts both `requestId` and `request_id` spellings on the wire.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// Opaque id of the operation this progress belongs to.
    #[serde(alias = "request_id")]
    pub request_id: String,
    /// How much work has been completed so far.
    pub progress: f64,
    /// Optional status message to display.
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of a `sampling/response` notification.
///
/// Accepts both `requestId` and `request_id` spellings on the wire.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SamplingResponse {
    /// Opaque id of the sampling operation this result belongs to.
    #[serde(alias = "request_id")]
    pub request_id: String,
    /// The completed sampling result.
    pub result: CreateMessageResult,
}

/// Payload of a `logging` notification.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LogMessage {
    /// Wire index of the severity level (see [`McpLogLevel::from_index`]).
    pub level: u8,
    /// The log message body.
    pub message: String,
    /// Name of the logger that emitted the message.
    #[serde(default)]
    pub logger: Option<String>,
    /// Structured data attached to the message.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl LogMessage {
    /// The severity as an [`McpLogLevel`]; `None` when the index is unknown.
    #[must_use]
    pub fn log_level(&self) -> Option<McpLogLevel> {
        McpLogLevel::from_index(self.level)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
