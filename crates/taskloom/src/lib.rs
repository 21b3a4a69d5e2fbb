//! # Taskloom
//!
//! Taskloom is a runtime for executing conversational agent tasks. It turns
//! an inbound request into an ordered stream of lifecycle events, keeps
//! bounded per-session conversation history, and dispatches named tools on
//! the agent's behalf.
//!
//! ## Core Components
//!
//! - **[TaskExecutor] / [TaskRuntime]**: the task lifecycle state machine
//!   with cooperative cancellation
//! - **[ConversationMemory] / [DurableMemory]**: bounded conversation
//!   history with optional best-effort durable backing
//! - **[ToolRegistry]**: named sync/async capabilities with exported schemas
//! - **[Processor]**: the injected agent-specific logic turning input text
//!   into output text
//!
//! ## Quick Start
//!
//! ```rust
//! use taskloom::{
//!     CancellationToken, Message, ProcessError, Processor, TaskContext, TaskEvent,
//!     TaskExecutor, TaskRequest,
//! };
//!
//! struct EchoAgent;
//!
//! #[taskloom::async_trait]
//! impl Processor for EchoAgent {
//!     async fn process(&self, text: &str, _ctx: &TaskContext) -> Result<String, ProcessError> {
//!         Ok(format!("echo: {text}"))
//!     }
//! }
//!
//! # tokio_runtime().block_on(async {
//! let executor = TaskExecutor::new(EchoAgent);
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//!
//! let request = TaskRequest::new(Message::user("hi")).with_task_id("t1");
//! let task = executor.execute(request, CancellationToken::new(), tx).await;
//!
//! assert!(matches!(task.terminal_event(), Some(TaskEvent::Completed { .. })));
//! # });
//! # fn tokio_runtime() -> tokio::runtime::Runtime {
//! #     tokio::runtime::Builder::new_current_thread()
//! #         .enable_time()
//! #         .build()
//! #         .unwrap()
//! # }
//! ```

pub use taskloom_core::{
    DataPart, Message, MemoryError, Part, ProcessError, ProgressSender, Processor, Role,
    RuntimeConfig, Task, TaskContext, TaskError, TaskEvent, TaskExecutor, TaskHandle, TaskRequest,
    TaskRuntime, TaskState, TextPart, ToolError, ToolFault,
};

pub use taskloom_memory::{
    ConversationMemory, DurableMemory, InProcessBackend, MemoryBackend, MemoryConfig, MemoryStats,
};

pub use taskloom_tools::{ToolDefinition, ToolHandle, ToolRegistry, ToolSchema};

// Re-exported so downstream Processor impls don't need their own direct
// dependency on these crates.
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
