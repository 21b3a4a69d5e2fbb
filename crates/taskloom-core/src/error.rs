//! Error types for the taskloom runtime.
//!
//! Each component has its own error enum with a distinct handling contract:
//! task errors guard the lifecycle state machine, processing errors are absorbed
//! at the executor boundary, tool errors surface to whoever invoked the
//! registry, and memory persistence errors are logged and never propagated.

use thiserror::Error;

/// Opaque fault raised inside a tool callable.
///
/// The registry annotates these with the tool name but otherwise passes them
/// through unchanged as the `source` of [`ToolError::InvocationFailed`].
pub type ToolFault = Box<dyn std::error::Error + Send + Sync>;

/// Errors guarding the task lifecycle state machine.
#[derive(Debug, Error)]
pub enum TaskError {
    /// An event was emitted after the task already reached a terminal state
    #[error("task {task_id} is already terminal ({state}); no further events may be emitted")]
    AlreadyTerminal { task_id: String, state: String },

    /// An event implied a state transition the lifecycle does not allow
    #[error("invalid state transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: String,
        to: String,
    },

    /// The execution flow driving the task was aborted before finishing
    #[error("execution flow for task {task_id} was aborted")]
    Aborted { task_id: String },
}

/// Result type for task lifecycle operations
pub type TaskResult<T> = Result<T, TaskError>;

/// Fault raised by an injected processing capability.
///
/// These never escape the executor: it converts them to a `Failed` terminal
/// event and logs the underlying cause.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProcessError {
    /// Human-readable description of the fault
    pub message: String,
}

impl ProcessError {
    /// Create a process error from any displayable cause
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ProcessError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ProcessError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl From<ToolError> for ProcessError {
    fn from(err: ToolError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

impl From<MemoryError> for ProcessError {
    fn from(err: MemoryError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Errors surfaced by the tool registry.
///
/// Unlike processing faults these are not swallowed anywhere in the runtime;
/// the invoker decides what a missing or failing tool means for its own
/// control flow.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool is registered under the requested name
    #[error("tool not found: {name}")]
    NotFound { name: String },

    /// The tool requires asynchronous execution and was invoked synchronously
    #[error("tool '{name}' requires async invocation")]
    NotSupported { name: String },

    /// The tool's callable raised a fault; propagated with the name attached
    #[error("tool '{name}' invocation failed: {source}")]
    InvocationFailed {
        name: String,
        #[source]
        source: ToolFault,
    },
}

impl ToolError {
    /// Create a not-found error for the given tool name
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a not-supported error for the given tool name
    pub fn not_supported(name: impl Into<String>) -> Self {
        Self::NotSupported { name: name.into() }
    }

    /// Wrap a callable fault with the tool name it came from
    pub fn invocation_failed(name: impl Into<String>, source: ToolFault) -> Self {
        Self::InvocationFailed {
            name: name.into(),
            source,
        }
    }

    /// The tool name this error refers to
    pub fn tool_name(&self) -> &str {
        match self {
            ToolError::NotFound { name }
            | ToolError::NotSupported { name }
            | ToolError::InvocationFailed { name, .. } => name,
        }
    }
}

/// Result type for tool registry operations
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors raised by memory persistence backends.
///
/// Durable memory catches and logs these at the point of occurrence; they
/// never fail or roll back the corresponding in-memory mutation.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Writing to or deleting from the durable backend failed
    #[error("persistence failed for session {session_id}: {reason}")]
    Persistence { session_id: String, reason: String },

    /// Loading session state from the durable backend failed
    #[error("hydration failed for session {session_id}: {reason}")]
    Hydration { session_id: String, reason: String },
}

impl MemoryError {
    /// Create a persistence error
    pub fn persistence(session_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Persistence {
            session_id: session_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a hydration error
    pub fn hydration(session_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Hydration {
            session_id: session_id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for memory backend operations
pub type MemoryResult<T> = Result<T, MemoryError>;
