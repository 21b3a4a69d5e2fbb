//! # Taskloom Tools
//!
//! Named callable capabilities for the taskloom agent runtime.
//!
//! A [`ToolRegistry`] holds [`ToolDefinition`]s keyed by unique name and
//! dispatches invocations to their sync or async callables. Registration is
//! last-writer-wins; invocation faults are annotated with the tool name and
//! propagated unchanged to the invoker.

pub mod definition;
pub mod registry;

pub use definition::{AsyncToolFn, SyncToolFn, ToolCallable, ToolDefinition, ToolSchema};
pub use registry::{ToolHandle, ToolRegistry};

// Re-export the error types callers match on.
pub use taskloom_core::error::{ToolError, ToolFault, ToolResult};
