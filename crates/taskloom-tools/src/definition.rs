//! Tool definitions and schemas.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use taskloom_core::error::ToolFault;

/// Synchronous tool callable: keyword-style JSON arguments in, JSON out.
pub type SyncToolFn =
    Arc<dyn Fn(serde_json::Value) -> Result<serde_json::Value, ToolFault> + Send + Sync>;

/// Asynchronous tool callable for tools that need to suspend.
pub type AsyncToolFn = Arc<
    dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<serde_json::Value, ToolFault>>
        + Send
        + Sync,
>;

/// The body of a tool: directly callable, or requiring suspension.
#[derive(Clone)]
pub enum ToolCallable {
    /// Callable that completes without suspending
    Sync(SyncToolFn),

    /// Callable that must be awaited
    Async(AsyncToolFn),
}

impl std::fmt::Debug for ToolCallable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolCallable::Sync(_) => write!(f, "ToolCallable::Sync"),
            ToolCallable::Async(_) => write!(f, "ToolCallable::Async"),
        }
    }
}

/// A named, independently invocable capability.
///
/// The parameter schema is a structural description (JSON-schema-shaped by
/// convention) that the registry exports but does not enforce; tools
/// validate their own arguments.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Unique name within a registry
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Structural description of accepted arguments
    pub parameters: serde_json::Value,

    /// Classification tags for lookup
    pub tags: Vec<String>,

    /// The callable body
    pub callable: ToolCallable,
}

impl ToolDefinition {
    /// Define a synchronous tool.
    pub fn sync<F>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(serde_json::Value) -> Result<serde_json::Value, ToolFault> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: empty_parameters(),
            tags: Vec::new(),
            callable: ToolCallable::Sync(Arc::new(f)),
        }
    }

    /// Define an asynchronous tool from a future-returning closure.
    pub fn asynchronous<F, Fut>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, ToolFault>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: empty_parameters(),
            tags: Vec::new(),
            callable: ToolCallable::Async(Arc::new(move |args| f(args).boxed())),
        }
    }

    /// Attach a parameter schema
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Add a classification tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Whether this tool requires asynchronous invocation
    pub fn is_async(&self) -> bool {
        matches!(self.callable, ToolCallable::Async(_))
    }

    /// The neutral structural descriptor for this tool
    pub fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

fn empty_parameters() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Machine-readable descriptor for one registered tool.
///
/// Deliberately neutral: converting this shape to a specific third-party
/// tool-calling convention is an adapter concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchema {
    /// Tool name
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Parameter schema as registered
    pub parameters: serde_json::Value,
}
