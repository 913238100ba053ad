//! Tool metadata cache
//!
//! [`ToolRegistry`] decouples tool discovery from schema use: listings hand
//! out the cheap name+description projection ([`ToolMetadata`]) while the
//! full definitions -- input schemas included -- stay cached for on-demand
//! lookup. The registry is owned by the caller and shared with the client
//! facade, which only mutates it through
//! [`crate::McpClient::list_tools_metadata`].

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::types::{Tool, ToolMetadata};

/// Caller-owned cache of full tool definitions, keyed by tool name.
///
/// All methods take `&self`; the registry is internally synchronized and can
/// be shared behind an `Arc`.
///
/// # Examples
///
/// ```
/// use xzmcp::registry::ToolRegistry;
/// use xzmcp::types::Tool;
///
/// let registry = ToolRegistry::new();
/// assert!(!registry.is_initialized());
///
/// let tool: Tool = serde_json::from_value(serde_json::json!({
///     "name": "search", "description": "Search the web", "inputSchema": { "type": "object" }
/// })).unwrap();
/// registry.cache_from_tools(vec![tool]);
///
/// assert!(registry.is_initialized());
/// assert!(registry.has_tool("search"));
/// assert_eq!(registry.get_all_metadata().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ToolRegistry {
    inner: RwLock<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    tools: BTreeMap<String, Tool>,
    initialized: bool,
}

impl ToolRegistry {
    /// Create an empty, uninitialized registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached contents wholesale and mark the registry
    /// initialized.
    pub fn cache_from_tools(&self, tools: Vec<Tool>) {
        let mut state = self.inner.write();
        state.tools = tools
            .into_iter()
            .map(|tool| (tool.name.clone(), tool))
            .collect();
        state.initialized = true;
    }

    /// Replace the cached contents from raw JSON tool objects.
    ///
    /// # Errors
    ///
    /// Returns a serialization error when any entry is not a valid tool; the
    /// registry is left untouched in that case.
    pub fn cache_from_values(&self, values: Vec<serde_json::Value>) -> Result<()> {
        let tools = values
            .into_iter()
            .map(serde_json::from_value::<Tool>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.cache_from_tools(tools);
        Ok(())
    }

    /// The metadata projection of every cached tool, ordered by name.
    #[must_use]
    pub fn get_all_metadata(&self) -> Vec<ToolMetadata> {
        self.inner
            .read()
            .tools
            .values()
            .map(ToolMetadata::from)
            .collect()
    }

    /// Metadata for one tool; `None` when the name is unknown.
    #[must_use]
    pub fn get_metadata(&self, name: &str) -> Option<ToolMetadata> {
        self.inner.read().tools.get(name).map(ToolMetadata::from)
    }

    /// Input schema for one tool; `None` when the name is unknown.
    #[must_use]
    pub fn get_schema(&self, name: &str) -> Option<serde_json::Value> {
        self.inner
            .read()
            .tools
            .get(name)
            .map(|tool| tool.input_schema.clone())
    }

    /// Whether a tool with this name is cached.
    #[must_use]
    pub fn has_tool(&self, name: &str) -> bool {
        self.inner.read().tools.contains_key(name)
    }

    /// Number of cached tools.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.read().tools.len()
    }

    /// Names of all cached tools, ordered.
    #[must_use]
    pub fn tool_names(&self) -> Vec<String> {
        self.inner.read().tools.keys().cloned().collect()
    }

    /// Whether the registry has been populated since construction or the
    /// last [`ToolRegistry::invalidate_all`].
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.read().initialized
    }

    /// Drop every cached tool and return to the uninitialized state.
    pub fn invalidate_all(&self) {
        let mut state = self.inner.write();
        state.tools.clear();
        state.initialized = false;
    }
}
