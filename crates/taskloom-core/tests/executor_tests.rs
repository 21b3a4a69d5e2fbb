//! Integration tests for the task executor and runtime.
//!
//! These exercise the observable lifecycle contract: event ordering, the
//! terminal-last invariant, fault isolation at the processing boundary, and
//! cooperative cancellation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use taskloom_core::{
    Message, Part, ProcessError, ProgressSender, Processor, Role, RuntimeConfig, TaskContext,
    TaskEvent, TaskExecutor, TaskRequest, TaskRuntime, TaskState,
};

// =============================================================================
// Test Processors
// =============================================================================

/// Replies with a fixed greeting and records whether it was invoked.
struct Greeter {
    invoked: Arc<AtomicBool>,
}

impl Greeter {
    fn new() -> (Self, Arc<AtomicBool>) {
        let invoked = Arc::new(AtomicBool::new(false));
        (
            Self {
                invoked: Arc::clone(&invoked),
            },
            invoked,
        )
    }
}

#[async_trait]
impl Processor for Greeter {
    async fn process(&self, _text: &str, _ctx: &TaskContext) -> Result<String, ProcessError> {
        self.invoked.store(true, Ordering::SeqCst);
        Ok("hello back".to_string())
    }
}

/// Fails every request.
struct Faulty;

#[async_trait]
impl Processor for Faulty {
    async fn process(&self, _text: &str, _ctx: &TaskContext) -> Result<String, ProcessError> {
        Err(ProcessError::new("backend unavailable"))
    }
}

/// Panics; the executor must contain it.
struct Panicky;

#[async_trait]
impl Processor for Panicky {
    async fn process(&self, _text: &str, _ctx: &TaskContext) -> Result<String, ProcessError> {
        panic!("boom");
    }
}

/// Sleeps long enough for a cancel to land first.
struct Slow;

#[async_trait]
impl Processor for Slow {
    async fn process(&self, _text: &str, _ctx: &TaskContext) -> Result<String, ProcessError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }
}

/// Streams a couple of progress updates before answering.
struct Narrator;

#[async_trait]
impl Processor for Narrator {
    async fn process(&self, text: &str, _ctx: &TaskContext) -> Result<String, ProcessError> {
        Ok(format!("done: {text}"))
    }

    async fn process_streaming(
        &self,
        text: &str,
        ctx: &TaskContext,
        progress: ProgressSender,
    ) -> Result<String, ProcessError> {
        progress
            .progress("looking things up")
            .map_err(|e| ProcessError::new(e.to_string()))?;
        progress
            .progress("drafting answer")
            .map_err(|e| ProcessError::new(e.to_string()))?;
        self.process(text, ctx).await
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<TaskEvent>) -> Vec<TaskEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn assert_terminal_last(events: &[TaskEvent]) {
    let terminal_count = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminal_count, 1, "exactly one terminal event: {events:?}");
    assert!(
        events.last().is_some_and(TaskEvent::is_terminal),
        "terminal event must be last: {events:?}"
    );
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn happy_path_emits_submitted_progress_completed() {
    let (greeter, _) = Greeter::new();
    let executor = TaskExecutor::new(greeter);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let request = TaskRequest::new(Message::user("hi")).with_task_id("t1");
    let task = executor
        .execute(request, CancellationToken::new(), tx)
        .await;

    assert_eq!(task.id, "t1");
    assert_eq!(task.state, TaskState::Completed);

    let events = drain(&mut rx);
    assert_terminal_last(&events);
    assert_eq!(events[0], TaskEvent::Submitted);
    assert_eq!(events[1], TaskEvent::progress("processing..."));
    match &events[2] {
        TaskEvent::Completed { result } => {
            assert_eq!(result.role, Role::Assistant);
            assert_eq!(result.text(), Some("hello back"));
        }
        other => panic!("expected Completed, got {other:?}"),
    }

    // The sink and the event log observed the same sequence.
    assert_eq!(task.events, events);
}

#[tokio::test]
async fn request_without_text_fails_without_invoking_processor() {
    let (greeter, invoked) = Greeter::new();
    let executor = TaskExecutor::new(greeter);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let message = Message {
        id: None,
        role: Role::User,
        parts: vec![Part::data(serde_json::json!({"blob": true}), "application/json")],
        timestamp: None,
        metadata: HashMap::new(),
    };
    let task = executor
        .execute(
            TaskRequest::new(message).with_task_id("t-empty"),
            CancellationToken::new(),
            tx,
        )
        .await;

    assert_eq!(task.state, TaskState::Failed);
    assert!(!invoked.load(Ordering::SeqCst));

    let events = drain(&mut rx);
    assert_terminal_last(&events);
    match events.last() {
        Some(TaskEvent::Failed { reason }) => {
            assert_eq!(reason, "no valid message content");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn processing_fault_becomes_failed_event() {
    let executor = TaskExecutor::new(Faulty);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let task = executor
        .execute(
            TaskRequest::new(Message::user("hi")).with_task_id("t-fault"),
            CancellationToken::new(),
            tx,
        )
        .await;

    assert_eq!(task.state, TaskState::Failed);
    let events = drain(&mut rx);
    assert_terminal_last(&events);
    match events.last() {
        Some(TaskEvent::Failed { reason }) => {
            assert!(reason.contains("backend unavailable"), "{reason}");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn processor_panic_is_contained() {
    let executor = TaskExecutor::new(Panicky);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let task = executor
        .execute(
            TaskRequest::new(Message::user("hi")).with_task_id("t-panic"),
            CancellationToken::new(),
            tx,
        )
        .await;

    assert_eq!(task.state, TaskState::Failed);
    assert_terminal_last(&drain(&mut rx));
}

#[tokio::test]
async fn streaming_processor_pushes_progress_before_terminal() {
    let executor = TaskExecutor::new(Narrator);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let task = executor
        .execute_streaming(
            TaskRequest::new(Message::user("rust")).with_task_id("t-stream"),
            CancellationToken::new(),
            tx,
        )
        .await;

    assert_eq!(task.state, TaskState::Completed);
    let events = drain(&mut rx);
    assert_terminal_last(&events);
    assert_eq!(events[0], TaskEvent::Submitted);
    assert_eq!(events[1], TaskEvent::progress("processing..."));
    assert_eq!(events[2], TaskEvent::progress("looking things up"));
    assert_eq!(events[3], TaskEvent::progress("drafting answer"));
    match events.last() {
        Some(TaskEvent::Completed { result }) => {
            assert_eq!(result.text(), Some("done: rust"));
        }
        other => panic!("expected Completed, got {other:?}"),
    }
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn cancel_before_terminal_yields_canceled() {
    let config = RuntimeConfig {
        cancel_grace_ms: 20,
        ..RuntimeConfig::default()
    };
    let runtime = TaskRuntime::with_config(Slow, config);

    let mut handle = runtime.submit(TaskRequest::new(Message::user("hi")).with_task_id("t-slow"));

    // Wait until the task is observably in progress.
    let first = handle.events.recv().await.unwrap();
    assert_eq!(first, TaskEvent::Submitted);
    let second = handle.events.recv().await.unwrap();
    assert!(matches!(second, TaskEvent::Progress { .. }));

    assert!(runtime.cancel("t-slow"));

    let task = handle.finished().await.unwrap();
    assert_eq!(task.state, TaskState::Canceled);
    assert_eq!(task.terminal_event(), Some(&TaskEvent::Canceled));
}

#[tokio::test]
async fn cancel_after_terminal_is_a_noop() {
    let (greeter, _) = Greeter::new();
    let runtime = TaskRuntime::new(greeter);

    let handle = runtime.submit(TaskRequest::new(Message::user("hi")).with_task_id("t-done"));
    let task = handle.finished().await.unwrap();
    assert_eq!(task.state, TaskState::Completed);

    // The task is gone from the active set; cancel neither errors nor
    // rewrites the recorded terminal event.
    assert!(!runtime.cancel("t-done"));
    assert!(matches!(
        task.terminal_event(),
        Some(TaskEvent::Completed { .. })
    ));
}

#[tokio::test]
async fn cancellation_wins_even_when_processor_finishes_in_grace() {
    // Processor that finishes quickly once polled, after cancel already hit.
    struct Quick;

    #[async_trait]
    impl Processor for Quick {
        async fn process(&self, _text: &str, _ctx: &TaskContext) -> Result<String, ProcessError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok("finished anyway".to_string())
        }
    }

    let config = RuntimeConfig {
        cancel_grace_ms: 500,
        ..RuntimeConfig::default()
    };
    let executor = TaskExecutor::with_config(Quick, config);
    let (tx, _rx) = mpsc::unbounded_channel();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let task = executor
        .execute(
            TaskRequest::new(Message::user("hi")).with_task_id("t-race"),
            cancel,
            tx,
        )
        .await;

    assert_eq!(task.state, TaskState::Canceled);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn concurrent_tasks_each_get_one_terminal_event() {
    let (greeter, _) = Greeter::new();
    let runtime = Arc::new(TaskRuntime::new(greeter));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            runtime.submit(
                TaskRequest::new(Message::user(format!("message {i}")))
                    .with_task_id(format!("t-{i}")),
            )
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let task = handle.finished().await.unwrap();
        assert_eq!(task.id, format!("t-{i}"));
        assert_eq!(task.state, TaskState::Completed);
        assert_terminal_last(&task.events);
    }

    assert!(runtime.running_tasks().is_empty());
}
