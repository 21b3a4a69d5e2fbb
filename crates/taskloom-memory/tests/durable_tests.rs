//! Integration tests for durable-backed memory: best-effort persistence,
//! hydration, and failure isolation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use taskloom_core::Message;
use taskloom_core::error::{MemoryError, MemoryResult};
use taskloom_memory::{DurableMemory, InProcessBackend, MemoryBackend, MemoryConfig};

/// Backend that refuses every operation, counting the attempts.
struct FailingBackend {
    attempts: AtomicUsize,
}

impl FailingBackend {
    fn new() -> Self {
        Self {
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MemoryBackend for FailingBackend {
    async fn write(&self, session_id: &str, _messages: &[Message]) -> MemoryResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MemoryError::persistence(session_id, "store offline"))
    }

    async fn read(&self, session_id: &str) -> MemoryResult<Vec<Message>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MemoryError::hydration(session_id, "store offline"))
    }

    async fn delete(&self, session_id: &str) -> MemoryResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MemoryError::persistence(session_id, "store offline"))
    }
}

#[tokio::test]
async fn appends_are_mirrored_to_the_backend() {
    let backend = Arc::new(InProcessBackend::new());
    let memory = DurableMemory::new(Arc::clone(&backend) as Arc<dyn MemoryBackend>);

    memory.append("s1", Message::user("hello")).await;
    memory.append("s1", Message::assistant("hi there")).await;

    let persisted = backend.read("s1").await.unwrap();
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted[0].text(), Some("hello"));
}

#[tokio::test]
async fn hydration_restores_history_on_first_touch() {
    let backend = Arc::new(InProcessBackend::new());
    backend
        .write("s1", &[Message::user("from a previous run")])
        .await
        .unwrap();

    let memory = DurableMemory::new(Arc::clone(&backend) as Arc<dyn MemoryBackend>);
    let rendered = memory.render_history("s1").await;
    assert_eq!(rendered, "user: from a previous run");

    // Appends extend the hydrated history rather than replacing it.
    memory.append("s1", Message::assistant("welcome back")).await;
    assert_eq!(memory.stats("s1").await.total_messages, 2);
}

#[tokio::test]
async fn hydration_respects_the_capacity_bound() {
    let backend = Arc::new(InProcessBackend::new());
    let oversized: Vec<Message> = (0..10).map(|i| Message::user(format!("m{i}"))).collect();
    backend.write("s1", &oversized).await.unwrap();

    let memory = DurableMemory::with_config(
        MemoryConfig { capacity: 3 },
        Arc::clone(&backend) as Arc<dyn MemoryBackend>,
    );

    let messages = memory.query("s1", None, None).await;
    let texts: Vec<_> = messages.iter().filter_map(|m| m.text()).collect();
    assert_eq!(texts, vec!["m7", "m8", "m9"]);
}

#[tokio::test]
async fn persistence_failure_never_affects_in_memory_state() {
    let backend = Arc::new(FailingBackend::new());
    let memory = DurableMemory::new(Arc::clone(&backend) as Arc<dyn MemoryBackend>);

    memory.append("s1", Message::user("hello")).await;
    memory.append("s1", Message::assistant("hi")).await;

    // Both appends (and the initial hydration) hit the backend and failed,
    // yet the in-memory history is intact.
    assert!(backend.attempts.load(Ordering::SeqCst) >= 3);
    assert_eq!(memory.stats("s1").await.total_messages, 2);

    memory.clear("s1").await;
    assert_eq!(memory.stats("s1").await.total_messages, 0);
}

#[tokio::test]
async fn clear_evicts_from_the_backend() {
    let backend = Arc::new(InProcessBackend::new());
    let memory = DurableMemory::new(Arc::clone(&backend) as Arc<dyn MemoryBackend>);

    memory.append("s1", Message::user("hello")).await;
    memory.set_meta("s1", "topic", serde_json::json!("greetings"));
    assert!(!backend.is_empty());

    memory.clear("s1").await;
    assert!(backend.read("s1").await.unwrap().is_empty());

    // Metadata namespace is untouched by clear.
    assert_eq!(
        memory.get_meta("s1", "topic", serde_json::Value::Null),
        serde_json::json!("greetings")
    );
}

/// Backend whose reads take long enough for another operation to land
/// mid-hydration.
struct SlowBackend {
    contents: Vec<Message>,
}

#[async_trait]
impl MemoryBackend for SlowBackend {
    async fn write(&self, _session_id: &str, _messages: &[Message]) -> MemoryResult<()> {
        Ok(())
    }

    async fn read(&self, _session_id: &str) -> MemoryResult<Vec<Message>> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(self.contents.clone())
    }

    async fn delete(&self, _session_id: &str) -> MemoryResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn append_during_hydration_is_not_lost() {
    let backend = Arc::new(SlowBackend {
        contents: vec![Message::user("from backend")],
    });
    let memory = Arc::new(DurableMemory::new(backend as Arc<dyn MemoryBackend>));

    // First touch starts the slow backend read on a separate flow.
    let reader = Arc::clone(&memory);
    let warmup = tokio::spawn(async move { reader.query("s1", None, None).await });

    // Append while that read is still in flight. It must wait for the
    // restored history rather than racing it.
    tokio::time::sleep(Duration::from_millis(10)).await;
    memory.append("s1", Message::assistant("live message")).await;

    warmup.await.unwrap();

    let messages = memory.query("s1", None, None).await;
    let texts: Vec<_> = messages.iter().filter_map(|m| m.text()).collect();
    assert_eq!(texts, vec!["from backend", "live message"]);
}

#[tokio::test]
async fn hydration_runs_once_per_session() {
    let backend = Arc::new(FailingBackend::new());
    let memory = DurableMemory::new(Arc::clone(&backend) as Arc<dyn MemoryBackend>);

    // Reads only: the sole backend call is the single hydration attempt.
    let _ = memory.query("s1", None, None).await;
    let _ = memory.render_history("s1").await;
    let _ = memory.stats("s1").await;

    assert_eq!(backend.attempts.load(Ordering::SeqCst), 1);
}
