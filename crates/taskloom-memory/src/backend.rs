//! Durable backing store boundary.

use async_trait::async_trait;
use dashmap::DashMap;

use taskloom_core::error::MemoryResult;
use taskloom_core::Message;

/// An addressable external store for session history.
///
/// Implementations are key-value-like: one entry per session, replaced
/// wholesale on write. No transactional guarantee is assumed; durable memory
/// treats every operation as best effort.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Persist the full message history for a session
    async fn write(&self, session_id: &str, messages: &[Message]) -> MemoryResult<()>;

    /// Load the message history for a session (empty when absent)
    async fn read(&self, session_id: &str) -> MemoryResult<Vec<Message>>;

    /// Remove the persisted history for a session
    async fn delete(&self, session_id: &str) -> MemoryResult<()>;
}

/// Process-local [`MemoryBackend`] backed by a concurrent map.
///
/// Useful as a default durable target and in tests; swap in a networked
/// implementation for real persistence.
#[derive(Default)]
pub struct InProcessBackend {
    entries: DashMap<String, Vec<Message>>,
}

impl InProcessBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently persisted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the backend holds no sessions
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl MemoryBackend for InProcessBackend {
    async fn write(&self, session_id: &str, messages: &[Message]) -> MemoryResult<()> {
        self.entries
            .insert(session_id.to_string(), messages.to_vec());
        Ok(())
    }

    async fn read(&self, session_id: &str) -> MemoryResult<Vec<Message>> {
        Ok(self
            .entries
            .get(session_id)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }

    async fn delete(&self, session_id: &str) -> MemoryResult<()> {
        self.entries.remove(session_id);
        Ok(())
    }
}
