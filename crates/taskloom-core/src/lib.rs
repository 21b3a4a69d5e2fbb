//! # Taskloom Core
//!
//! Core types and the task execution engine for the taskloom agent runtime.
//! This crate provides the task lifecycle state machine, the message data
//! model, and the pluggable processing boundary that agent implementations
//! hook into.

pub mod config;
pub mod error;
pub mod executor;
pub mod message;
pub mod runtime;
pub mod task;

pub use config::RuntimeConfig;
pub use error::{MemoryError, ProcessError, TaskError, ToolError, ToolFault};
pub use executor::{EventSink, ProgressSender, Processor, TaskContext, TaskExecutor, TaskRequest};
pub use message::{DataPart, Message, Part, Role, TextPart};
pub use runtime::{TaskHandle, TaskRuntime};
pub use task::{Task, TaskEvent, TaskState};
