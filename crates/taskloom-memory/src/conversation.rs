//! In-memory bounded conversation store.

use std::collections::{HashMap, VecDeque};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use taskloom_core::{Message, Role};

/// Configuration for a conversation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum messages retained per session before FIFO eviction
    pub capacity: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

/// Read-only statistics for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    /// Messages currently retained
    pub total_messages: usize,

    /// Configured retention bound
    pub capacity: usize,

    /// Retained messages with the user role
    pub user_messages: usize,

    /// Retained messages with the assistant role
    pub assistant_messages: usize,

    /// Metadata keys currently set for the session
    pub meta_keys: Vec<String>,
}

#[derive(Debug, Default)]
struct SessionRecord {
    messages: VecDeque<Message>,
    metadata: HashMap<String, serde_json::Value>,
}

/// Bounded, ordered conversation history keyed by session ID.
///
/// The store is shared across concurrent tasks. Mutations to a given
/// session are serialized by the map's per-shard write locks, which is what
/// preserves the eviction invariant under concurrent appends; reads clone a
/// snapshot at call time.
pub struct ConversationMemory {
    sessions: DashMap<String, SessionRecord>,
    config: MemoryConfig,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationMemory {
    /// Create a store with the default capacity (100 messages per session)
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::default())
    }

    /// Create a store with an explicit configuration.
    ///
    /// Capacity is fixed for the lifetime of the store.
    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    /// The configured per-session capacity
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Append a message to a session's history.
    ///
    /// The only operation that grows history. When the post-append length
    /// exceeds capacity, the oldest messages are evicted until the bound is
    /// restored.
    pub fn append(&self, session_id: &str, message: Message) {
        let mut record = self.sessions.entry(session_id.to_string()).or_default();
        record.messages.push_back(message);
        while record.messages.len() > self.config.capacity {
            record.messages.pop_front();
        }
        debug!(
            session_id = %session_id,
            total = record.messages.len(),
            "message appended"
        );
    }

    /// Retrieve messages from a session's history.
    ///
    /// `role_filter` is applied before `last_n`, so the result is the most
    /// recent N messages of the filtered subset, in original relative order.
    pub fn query(
        &self,
        session_id: &str,
        last_n: Option<usize>,
        role_filter: Option<Role>,
    ) -> Vec<Message> {
        let Some(record) = self.sessions.get(session_id) else {
            return Vec::new();
        };

        let filtered: Vec<&Message> = record
            .messages
            .iter()
            .filter(|m| role_filter.is_none_or(|role| m.role == role))
            .collect();

        let skip = match last_n {
            Some(n) => filtered.len().saturating_sub(n),
            None => 0,
        };
        filtered.into_iter().skip(skip).cloned().collect()
    }

    /// Render a session's history as readable text.
    ///
    /// Messages appear in storage order as `"{role}: {joined text parts}"`,
    /// separated by blank lines. Messages with no extractable text are
    /// skipped. This is a pure read.
    pub fn render_history(&self, session_id: &str) -> String {
        let Some(record) = self.sessions.get(session_id) else {
            return String::new();
        };

        let lines: Vec<String> = record
            .messages
            .iter()
            .filter_map(|m| m.joined_text().map(|text| format!("{}: {}", m.role, text)))
            .collect();
        lines.join("\n\n")
    }

    /// Remove all messages from a session.
    ///
    /// Metadata is a separate namespace and is left untouched.
    pub fn clear(&self, session_id: &str) {
        if let Some(mut record) = self.sessions.get_mut(session_id) {
            record.messages.clear();
            info!(session_id = %session_id, "session history cleared");
        }
    }

    /// Set a metadata value for a session (last write wins)
    pub fn set_meta(&self, session_id: &str, key: impl Into<String>, value: serde_json::Value) {
        let mut record = self.sessions.entry(session_id.to_string()).or_default();
        record.metadata.insert(key.into(), value);
    }

    /// Get a metadata value, or `default` when the key is unset
    pub fn get_meta(
        &self,
        session_id: &str,
        key: &str,
        default: serde_json::Value,
    ) -> serde_json::Value {
        self.sessions
            .get(session_id)
            .and_then(|record| record.metadata.get(key).cloned())
            .unwrap_or(default)
    }

    /// Current statistics for a session
    pub fn stats(&self, session_id: &str) -> MemoryStats {
        let (total, user, assistant, meta_keys) = match self.sessions.get(session_id) {
            Some(record) => (
                record.messages.len(),
                record
                    .messages
                    .iter()
                    .filter(|m| m.role == Role::User)
                    .count(),
                record
                    .messages
                    .iter()
                    .filter(|m| m.role == Role::Assistant)
                    .count(),
                record.metadata.keys().cloned().collect(),
            ),
            None => (0, 0, 0, Vec::new()),
        };

        MemoryStats {
            total_messages: total,
            capacity: self.config.capacity,
            user_messages: user,
            assistant_messages: assistant,
            meta_keys,
        }
    }

    /// IDs of sessions that currently hold state
    pub fn sessions(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }

    /// Tear down a session entirely: messages and metadata.
    pub fn remove_session(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Replace a session's message history wholesale.
    ///
    /// Used by durable memory when hydrating from a backend; the capacity
    /// bound is enforced on the way in.
    pub(crate) fn replace_messages(&self, session_id: &str, messages: Vec<Message>) {
        let mut record = self.sessions.entry(session_id.to_string()).or_default();
        let skip = messages.len().saturating_sub(self.config.capacity);
        record.messages = messages.into_iter().skip(skip).collect();
    }

    /// Snapshot a session's messages for persistence.
    pub(crate) fn snapshot_messages(&self, session_id: &str) -> Vec<Message> {
        self.sessions
            .get(session_id)
            .map(|record| record.messages.iter().cloned().collect())
            .unwrap_or_default()
    }
}
