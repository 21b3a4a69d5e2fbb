//! Tool registry: registration, lookup, and invocation.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error, info};

use taskloom_core::error::{ToolError, ToolResult};

use crate::definition::{ToolCallable, ToolDefinition, ToolSchema};

/// Handle returned by [`ToolRegistry::register`].
///
/// Registration is an explicit call, not an ambient side effect; the handle
/// names the definition that was installed and can be used to unregister it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolHandle {
    name: String,
}

impl ToolHandle {
    /// The registered tool name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Registry of named callable capabilities.
///
/// The definition map is read-mostly after startup: registration and
/// unregistration synchronize against concurrent lookups through the map's
/// shard locks, while individual invocations run independently and may
/// overlap freely.
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, Arc<ToolDefinition>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool definition under its name.
    ///
    /// Idempotent by name: re-registering an existing name atomically
    /// replaces the prior definition, last writer wins, no error.
    pub fn register(&self, definition: ToolDefinition) -> ToolHandle {
        let name = definition.name.clone();
        let replaced = self.tools.insert(name.clone(), Arc::new(definition));
        info!(tool = %name, replaced = replaced.is_some(), "tool registered");
        ToolHandle { name }
    }

    /// Remove a tool by name.
    ///
    /// Returns `true` when a definition was removed.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.tools.remove(name).is_some();
        if removed {
            info!(tool = %name, "tool unregistered");
        }
        removed
    }

    /// Look up a tool definition by name
    pub fn get(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.tools.get(name).map(|e| Arc::clone(e.value()))
    }

    /// Check whether a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All definitions carrying the given classification tag
    pub fn list_by_tag(&self, tag: &str) -> Vec<Arc<ToolDefinition>> {
        let mut matches: Vec<Arc<ToolDefinition>> = self
            .tools
            .iter()
            .filter(|e| e.value().tags.iter().any(|t| t == tag))
            .map(|e| Arc::clone(e.value()))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches
    }

    /// Names of all registered tools, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a synchronous tool by name.
    ///
    /// Fails with [`ToolError::NotFound`] for unknown names and
    /// [`ToolError::NotSupported`] for tools that require suspension. A
    /// fault raised by the callable is logged with the tool name and
    /// propagated unchanged as the error source.
    pub fn invoke(&self, name: &str, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let definition = self.get(name).ok_or_else(|| ToolError::not_found(name))?;

        match &definition.callable {
            ToolCallable::Sync(f) => {
                debug!(tool = %name, "invoking tool");
                f(args).map_err(|fault| {
                    error!(tool = %name, error = %fault, "tool invocation failed");
                    ToolError::invocation_failed(name, fault)
                })
            }
            ToolCallable::Async(_) => Err(ToolError::not_supported(name)),
        }
    }

    /// Invoke a tool by name, awaiting if it suspends.
    ///
    /// Synchronous callables may be invoked through this entry point too.
    pub async fn invoke_async(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> ToolResult<serde_json::Value> {
        let definition = self.get(name).ok_or_else(|| ToolError::not_found(name))?;

        debug!(tool = %name, "invoking tool");
        let result = match &definition.callable {
            ToolCallable::Sync(f) => f(args),
            ToolCallable::Async(f) => f(args).await,
        };

        result.map_err(|fault| {
            error!(tool = %name, error = %fault, "tool invocation failed");
            ToolError::invocation_failed(name, fault)
        })
    }

    /// One neutral structural descriptor per registered tool, sorted by name.
    pub fn export_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> =
            self.tools.iter().map(|e| e.value().schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }
}
