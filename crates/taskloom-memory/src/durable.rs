//! Durable-backed conversation memory.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use taskloom_core::{Message, Role};

use crate::backend::MemoryBackend;
use crate::conversation::{ConversationMemory, MemoryConfig, MemoryStats};

/// Conversation memory mirrored to an external store.
///
/// A composition decorator over [`ConversationMemory`]: the in-memory store
/// stays authoritative, and every append/clear is additionally persisted to
/// the backend. Persistence is strictly best effort; backend failures are
/// logged and never fail or roll back the in-memory mutation.
///
/// A session is hydrated from the backend once, on first touch. Hydration
/// failure leaves the session empty and is logged, not fatal.
pub struct DurableMemory {
    inner: ConversationMemory,
    backend: Arc<dyn MemoryBackend>,
    hydrated: DashMap<String, Arc<OnceCell<()>>>,
}

impl DurableMemory {
    /// Wrap a backend with default memory configuration
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self::with_config(MemoryConfig::default(), backend)
    }

    /// Wrap a backend with explicit memory configuration
    pub fn with_config(config: MemoryConfig, backend: Arc<dyn MemoryBackend>) -> Self {
        Self {
            inner: ConversationMemory::with_config(config),
            backend,
            hydrated: DashMap::new(),
        }
    }

    /// Load a session's history from the backend if not already done.
    ///
    /// Called implicitly by every session operation; exposed for callers
    /// that want to warm a session up front. Hydration is exclusive per
    /// session: concurrent operations on the same session await the
    /// in-flight backend read instead of racing it, so an append issued
    /// while hydration is running lands after the restored history.
    pub async fn hydrate(&self, session_id: &str) {
        let cell = self
            .hydrated
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        cell.get_or_init(|| async {
            match self.backend.read(session_id).await {
                Ok(messages) if !messages.is_empty() => {
                    debug!(
                        session_id = %session_id,
                        count = messages.len(),
                        "session hydrated from backend"
                    );
                    self.inner.replace_messages(session_id, messages);
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        session_id = %session_id,
                        error = %err,
                        "hydration failed; starting with empty session"
                    );
                }
            }
        })
        .await;
    }

    /// Append a message and mirror the session to the backend.
    pub async fn append(&self, session_id: &str, message: Message) {
        self.hydrate(session_id).await;
        self.inner.append(session_id, message);

        let snapshot = self.inner.snapshot_messages(session_id);
        if let Err(err) = self.backend.write(session_id, &snapshot).await {
            warn!(
                session_id = %session_id,
                error = %err,
                "persistence failed; in-memory state unaffected"
            );
        }
    }

    /// Retrieve messages; see [`ConversationMemory::query`].
    pub async fn query(
        &self,
        session_id: &str,
        last_n: Option<usize>,
        role_filter: Option<Role>,
    ) -> Vec<Message> {
        self.hydrate(session_id).await;
        self.inner.query(session_id, last_n, role_filter)
    }

    /// Render history as text; see [`ConversationMemory::render_history`].
    pub async fn render_history(&self, session_id: &str) -> String {
        self.hydrate(session_id).await;
        self.inner.render_history(session_id)
    }

    /// Clear a session's messages and evict it from the backend.
    ///
    /// Metadata stays untouched, as with the in-memory store.
    pub async fn clear(&self, session_id: &str) {
        self.hydrate(session_id).await;
        self.inner.clear(session_id);

        if let Err(err) = self.backend.delete(session_id).await {
            warn!(
                session_id = %session_id,
                error = %err,
                "backend eviction failed; in-memory state unaffected"
            );
        }
    }

    /// Set a metadata value (in-memory only; metadata is not persisted)
    pub fn set_meta(&self, session_id: &str, key: impl Into<String>, value: serde_json::Value) {
        self.inner.set_meta(session_id, key, value);
    }

    /// Get a metadata value with a default fallback
    pub fn get_meta(
        &self,
        session_id: &str,
        key: &str,
        default: serde_json::Value,
    ) -> serde_json::Value {
        self.inner.get_meta(session_id, key, default)
    }

    /// Current statistics for a session
    pub async fn stats(&self, session_id: &str) -> MemoryStats {
        self.hydrate(session_id).await;
        self.inner.stats(session_id)
    }
}
