//! Concurrent task runtime.
//!
//! [`TaskRuntime`] spawns one execution flow per submitted request and
//! tracks the cancellation token of every in-flight task so callers can
//! cancel by task ID while execution is still running.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::RuntimeConfig;
use crate::error::TaskError;
use crate::executor::{Processor, TaskExecutor, TaskRequest};
use crate::task::{Task, TaskEvent};

/// Handle to one in-flight task execution.
pub struct TaskHandle {
    /// ID of the running task
    pub task_id: String,

    /// Ordered lifecycle event stream, terminal event last
    pub events: mpsc::UnboundedReceiver<TaskEvent>,

    join: JoinHandle<Task>,
}

impl TaskHandle {
    /// Wait for the execution flow to finish and take the completed task.
    ///
    /// The task's event log always ends in exactly one terminal event.
    pub async fn finished(self) -> Result<Task, TaskError> {
        self.join.await.map_err(|_| TaskError::Aborted {
            task_id: self.task_id,
        })
    }
}

/// Runs tasks concurrently against a shared executor.
///
/// Each task executes on its own spawned flow; there is no shared state
/// between tasks beyond the processor itself. Cancellation is advisory and
/// cooperative: [`TaskRuntime::cancel`] trips the task's token, and the
/// executor guarantees the terminal event reflects it when it arrives before
/// completion.
pub struct TaskRuntime<P> {
    executor: TaskExecutor<P>,
    active: Arc<DashMap<String, CancellationToken>>,
}

impl<P: Processor> TaskRuntime<P> {
    /// Create a runtime with default configuration
    pub fn new(processor: P) -> Self {
        Self::with_config(processor, RuntimeConfig::default())
    }

    /// Create a runtime with explicit configuration
    pub fn with_config(processor: P, config: RuntimeConfig) -> Self {
        Self {
            executor: TaskExecutor::with_config(processor, config),
            active: Arc::new(DashMap::new()),
        }
    }

    /// Submit a request for execution.
    ///
    /// Returns immediately with a handle carrying the event stream; the
    /// `Submitted` and initial `Progress` events are already queued on it by
    /// the time the executor yields for the first time.
    pub fn submit(&self, request: TaskRequest) -> TaskHandle {
        self.spawn(request, false)
    }

    /// Submit a request, letting the processor stream progress events.
    pub fn submit_streaming(&self, request: TaskRequest) -> TaskHandle {
        self.spawn(request, true)
    }

    fn spawn(&self, mut request: TaskRequest, streaming: bool) -> TaskHandle {
        let task_id = request
            .task_id
            .take()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        request.task_id = Some(task_id.clone());

        let token = CancellationToken::new();
        self.active.insert(task_id.clone(), token.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let executor = self.executor.clone();
        let active = Arc::clone(&self.active);
        let flow_id = task_id.clone();

        let join = tokio::spawn(async move {
            let task = if streaming {
                executor.execute_streaming(request, token, tx).await
            } else {
                executor.execute(request, token, tx).await
            };
            active.remove(&flow_id);
            task
        });

        debug!(task_id = %task_id, streaming, "task submitted");
        TaskHandle {
            task_id,
            events: rx,
            join,
        }
    }

    /// Request cancellation of a running task.
    ///
    /// Returns `true` when a cancellation signal was delivered to an
    /// in-flight task. Canceling an unknown or already-finished task is an
    /// idempotent no-op returning `false`; it never alters an existing
    /// terminal event.
    pub fn cancel(&self, task_id: &str) -> bool {
        match self.active.get(task_id) {
            Some(token) => {
                info!(task_id = %task_id, "cancellation requested");
                token.cancel();
                true
            }
            None => {
                debug!(task_id = %task_id, "cancel for unknown or finished task ignored");
                false
            }
        }
    }

    /// IDs of tasks currently in flight
    pub fn running_tasks(&self) -> Vec<String> {
        self.active.iter().map(|e| e.key().clone()).collect()
    }
}
