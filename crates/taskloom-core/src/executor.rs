//! Task execution engine.
//!
//! The executor turns one inbound request into an ordered stream of
//! lifecycle events, invoking an injected [`Processor`] for the actual agent
//! logic. It is the fault-isolation boundary between a single task and the
//! surrounding runtime: processing faults (including panics) become `Failed`
//! terminal events and never escape.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::RuntimeConfig;
use crate::error::{ProcessError, TaskResult};
use crate::message::Message;
use crate::task::{Task, TaskEvent};

/// An inbound request: a task identity plus the message to process.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    /// Caller-supplied task ID; generated when absent
    pub task_id: Option<String>,

    /// Session the conversation belongs to, if any
    pub session_id: Option<String>,

    /// The message payload
    pub message: Message,
}

impl TaskRequest {
    /// Create a request for the given message with a generated task ID
    pub fn new(message: Message) -> Self {
        Self {
            task_id: None,
            session_id: None,
            message,
        }
    }

    /// Use a caller-supplied task ID
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Associate the request with a memory session
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Execution context handed to the processing capability.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// The task being executed
    pub task_id: String,

    /// Session the conversation belongs to, if any
    pub session_id: Option<String>,

    /// Open metadata for adapter use
    pub metadata: HashMap<String, serde_json::Value>,
}

/// The injected agent-specific processing capability.
///
/// Implementations turn input text into output text and may call tools or
/// read and write memory along the way. The executor is polymorphic over
/// exactly this strategy; echo agents, retrieval-augmented agents, and
/// tool-using agents all plug in here.
#[async_trait]
pub trait Processor: Send + Sync + 'static {
    /// Process the user's text and produce a response.
    async fn process(&self, text: &str, ctx: &TaskContext) -> Result<String, ProcessError>;

    /// Process with intermediate progress updates.
    ///
    /// The default implementation ignores the progress sender and delegates
    /// to [`Processor::process`]. Override to push `Progress` events through
    /// the task's sink while working; the terminal event is still emitted by
    /// the executor.
    async fn process_streaming(
        &self,
        text: &str,
        ctx: &TaskContext,
        progress: ProgressSender,
    ) -> Result<String, ProcessError> {
        let _ = progress;
        self.process(text, ctx).await
    }
}

/// Per-task event emitter.
///
/// Couples the caller-facing event channel to the task's own event log so
/// the two can never disagree: an event is forwarded if and only if the
/// state machine accepted it. Single-producer per task by construction.
#[derive(Clone)]
pub struct EventSink {
    task: Arc<Mutex<Task>>,
    tx: mpsc::UnboundedSender<TaskEvent>,
}

impl EventSink {
    fn new(task: Task, tx: mpsc::UnboundedSender<TaskEvent>) -> Self {
        Self {
            task: Arc::new(Mutex::new(task)),
            tx,
        }
    }

    /// Record an event in the task log and forward it to the caller.
    ///
    /// Rejected events (anything after a terminal event) are not forwarded.
    /// A dropped receiver does not fail the task; the event log remains the
    /// source of truth.
    pub fn emit(&self, event: TaskEvent) -> TaskResult<()> {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        task.record(&event)?;
        if self.tx.send(event).is_err() {
            debug!(task_id = %task.id, "event receiver dropped; continuing with log only");
        }
        Ok(())
    }

    /// ID of the task this sink belongs to
    pub fn task_id(&self) -> String {
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        task.id.clone()
    }

    /// Whether a terminal event has been recorded
    pub fn is_terminal(&self) -> bool {
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        task.is_terminal()
    }

    fn into_task(self) -> Task {
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        task.clone()
    }
}

/// Progress-only view of an [`EventSink`], handed to streaming processors.
///
/// Can emit any number of `Progress` events but no terminal event, so a
/// processor cannot violate the terminal-last invariant. Once the task is
/// terminal (e.g. canceled mid-flight), sends fail and the processor can use
/// that as its cancellation signal.
#[derive(Clone)]
pub struct ProgressSender {
    sink: EventSink,
}

impl ProgressSender {
    /// Emit an intermediate progress event
    pub fn progress(&self, message: impl Into<String>) -> TaskResult<()> {
        self.sink.emit(TaskEvent::progress(message))
    }
}

/// Executes tasks against an injected [`Processor`].
///
/// One executor serves any number of concurrent tasks; each call to
/// [`TaskExecutor::execute`] owns its task exclusively from submission to
/// the terminal event.
pub struct TaskExecutor<P> {
    processor: Arc<P>,
    config: RuntimeConfig,
}

impl<P> Clone for TaskExecutor<P> {
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            config: self.config.clone(),
        }
    }
}

impl<P: Processor> TaskExecutor<P> {
    /// Create an executor with default configuration
    pub fn new(processor: P) -> Self {
        Self::with_config(processor, RuntimeConfig::default())
    }

    /// Create an executor with explicit configuration
    pub fn with_config(processor: P, config: RuntimeConfig) -> Self {
        Self {
            processor: Arc::new(processor),
            config,
        }
    }

    /// The injected processing capability
    pub fn processor(&self) -> &Arc<P> {
        &self.processor
    }

    /// Execute one task to its terminal event.
    ///
    /// Emits `Submitted` and an initial `Progress` synchronously before any
    /// potentially slow work, then runs the processor. The returned [`Task`]
    /// carries the full event log for inspection or archiving; the same
    /// events arrive on `tx` in emission order.
    pub async fn execute(
        &self,
        request: TaskRequest,
        cancel: CancellationToken,
        tx: mpsc::UnboundedSender<TaskEvent>,
    ) -> Task {
        let (sink, ctx, text) = match self.enter(request, tx) {
            Ok(entered) => entered,
            Err(task) => return task,
        };

        let processor = Arc::clone(&self.processor);
        let flow = tokio::spawn(async move { processor.process(&text, &ctx).await });

        self.finish(sink, cancel, flow).await
    }

    /// Execute one task, letting the processor stream progress events.
    ///
    /// Same contract as [`TaskExecutor::execute`]; the processor additionally
    /// receives a [`ProgressSender`] for intermediate updates.
    pub async fn execute_streaming(
        &self,
        request: TaskRequest,
        cancel: CancellationToken,
        tx: mpsc::UnboundedSender<TaskEvent>,
    ) -> Task {
        let (sink, ctx, text) = match self.enter(request, tx) {
            Ok(entered) => entered,
            Err(task) => return task,
        };

        let processor = Arc::clone(&self.processor);
        let progress = ProgressSender { sink: sink.clone() };
        let flow = tokio::spawn(async move {
            processor.process_streaming(&text, &ctx, progress).await
        });

        self.finish(sink, cancel, flow).await
    }

    /// Emit the entry events and extract the request text.
    ///
    /// Returns the finished task early when the payload carries no
    /// extractable text; that is a local `Failed` outcome, not a fault, and
    /// the processor is never invoked.
    fn enter(
        &self,
        request: TaskRequest,
        tx: mpsc::UnboundedSender<TaskEvent>,
    ) -> Result<(EventSink, TaskContext, String), Task> {
        let task_id = request
            .task_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let sink = EventSink::new(Task::new(&task_id), tx);

        info!(task_id = %task_id, "task execution started");

        // A fresh task accepts these unconditionally.
        let _ = sink.emit(TaskEvent::Submitted);
        let _ = sink.emit(TaskEvent::progress("processing..."));

        let Some(text) = request.message.text().map(str::to_owned) else {
            warn!(task_id = %task_id, "request carried no extractable text content");
            let _ = sink.emit(TaskEvent::failed("no valid message content"));
            return Err(sink.into_task());
        };

        let ctx = TaskContext {
            task_id,
            session_id: request.session_id,
            metadata: HashMap::new(),
        };
        Ok((sink, ctx, text))
    }

    /// Await the processing flow, racing it against cancellation, and emit
    /// the terminal event.
    ///
    /// Cancellation is cooperative: once observed before a terminal event,
    /// the in-flight flow gets a bounded grace period to wind down, after
    /// which `Canceled` is emitted regardless. The flow itself is never
    /// forcibly interrupted; if it outlives the grace period it keeps
    /// running detached, and any late progress sends are rejected by the
    /// sink.
    async fn finish(
        &self,
        sink: EventSink,
        cancel: CancellationToken,
        mut flow: JoinHandle<Result<String, ProcessError>>,
    ) -> Task {
        let task_id = sink.task_id();

        let outcome = tokio::select! {
            result = &mut flow => Some(result),
            _ = cancel.cancelled() => {
                debug!(task_id = %task_id, "cancellation observed; entering grace period");
                tokio::time::timeout(self.config.cancel_grace(), &mut flow)
                    .await
                    .ok()
            }
        };

        // Cancellation requested before the terminal event always wins,
        // even when the processor managed to finish.
        if cancel.is_cancelled() {
            info!(task_id = %task_id, "task canceled");
            let _ = sink.emit(TaskEvent::Canceled);
            return sink.into_task();
        }

        match outcome {
            Some(Ok(Ok(response))) => {
                info!(task_id = %task_id, "task completed");
                let _ = sink.emit(TaskEvent::Completed {
                    result: Message::assistant(response),
                });
            }
            Some(Ok(Err(fault))) => {
                error!(task_id = %task_id, error = %fault, "processing capability failed");
                let _ = sink.emit(TaskEvent::failed(format!("execution error: {fault}")));
            }
            Some(Err(join_err)) => {
                error!(task_id = %task_id, error = %join_err, "processing flow panicked");
                let _ = sink.emit(TaskEvent::failed("processing capability panicked"));
            }
            // Unreachable without cancellation, which returned above.
            None => {
                let _ = sink.emit(TaskEvent::Canceled);
            }
        }

        sink.into_task()
    }
}
