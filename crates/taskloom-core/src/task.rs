//! Task lifecycle types.
//!
//! A task is one request-to-terminal-event execution unit. It owns an
//! ordered log of lifecycle events and a state machine that guarantees
//! exactly one terminal event per task, always last.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};
use crate::message::Message;

/// A lifecycle event emitted during task execution.
///
/// Events are immutable once created; they are appended to the task's event
/// log and forwarded to the caller's sink in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TaskEvent {
    /// Task was accepted for execution
    Submitted,

    /// Intermediate progress update
    Progress {
        /// Human-readable progress description
        message: String,
    },

    /// Task finished successfully with a response message
    Completed {
        /// The agent's response
        result: Message,
    },

    /// Task failed; carries a human-readable reason
    Failed {
        /// Why the task failed
        reason: String,
    },

    /// Task was canceled before completing
    Canceled,
}

impl TaskEvent {
    /// Create a progress event
    pub fn progress(message: impl Into<String>) -> Self {
        TaskEvent::Progress {
            message: message.into(),
        }
    }

    /// Create a failure event
    pub fn failed(reason: impl Into<String>) -> Self {
        TaskEvent::Failed {
            reason: reason.into(),
        }
    }

    /// Check if this event ends the task's event stream
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskEvent::Completed { .. } | TaskEvent::Failed { .. } | TaskEvent::Canceled
        )
    }

    /// The lifecycle state a task is in once this event has been recorded
    pub fn state_after(&self) -> TaskState {
        match self {
            TaskEvent::Submitted => TaskState::Submitted,
            TaskEvent::Progress { .. } => TaskState::InProgress,
            TaskEvent::Completed { .. } => TaskState::Completed,
            TaskEvent::Failed { .. } => TaskState::Failed,
            TaskEvent::Canceled => TaskState::Canceled,
        }
    }
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Task exists but no event has been emitted yet
    Created,

    /// Submitted event has been emitted
    Submitted,

    /// At least one progress event has been emitted
    InProgress,

    /// Task completed successfully
    Completed,

    /// Task failed
    Failed,

    /// Task was canceled
    Canceled,
}

impl TaskState {
    /// Check if this state is absorbing: no event may follow it.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Created => write!(f, "created"),
            TaskState::Submitted => write!(f, "submitted"),
            TaskState::InProgress => write!(f, "in-progress"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::Canceled => write!(f, "canceled"),
        }
    }
}

/// One task execution: identity, current state, and the ordered event log.
///
/// A task is owned exclusively by its executor for the duration of one
/// execution and handed back (for inspection or archiving) once a terminal
/// event has been recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task
    pub id: String,

    /// Current lifecycle state
    pub state: TaskState,

    /// Every event emitted so far, in emission order
    pub events: Vec<TaskEvent>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the last event was recorded
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task with the given ID
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            state: TaskState::Created,
            events: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new task with a generated UUID
    pub fn new_with_uuid() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Record an event, advancing the state machine.
    ///
    /// Fails with [`TaskError::AlreadyTerminal`] if a terminal event has
    /// already been recorded, and with [`TaskError::InvalidTransition`] for
    /// transitions the lifecycle does not allow (e.g. a second `Submitted`).
    pub fn record(&mut self, event: &TaskEvent) -> TaskResult<()> {
        if self.state.is_terminal() {
            return Err(TaskError::AlreadyTerminal {
                task_id: self.id.clone(),
                state: self.state.to_string(),
            });
        }

        let next = event.state_after();
        let allowed = match event {
            TaskEvent::Submitted => self.state == TaskState::Created,
            TaskEvent::Progress { .. } => {
                matches!(self.state, TaskState::Submitted | TaskState::InProgress)
            }
            // Terminal events are allowed as soon as the task is submitted;
            // cancellation in particular can land before any progress.
            _ => matches!(self.state, TaskState::Submitted | TaskState::InProgress),
        };

        if !allowed {
            return Err(TaskError::InvalidTransition {
                task_id: self.id.clone(),
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }

        self.state = next;
        self.events.push(event.clone());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The terminal event, if one has been recorded.
    ///
    /// When present it is always the last event in the log.
    pub fn terminal_event(&self) -> Option<&TaskEvent> {
        self.events.last().filter(|e| e.is_terminal())
    }
}
