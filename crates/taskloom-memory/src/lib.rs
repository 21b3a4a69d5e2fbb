//! # Taskloom Memory
//!
//! Bounded per-session conversation memory for the taskloom agent runtime.
//!
//! [`ConversationMemory`] keeps the most recent N messages per session with
//! FIFO eviction and a separate metadata namespace. [`DurableMemory`] wraps
//! it with best-effort persistence to a pluggable [`MemoryBackend`]: every
//! append and clear is mirrored to the backend, and backend failures are
//! logged without ever failing the in-memory mutation.

pub mod backend;
pub mod conversation;
pub mod durable;

pub use backend::{InProcessBackend, MemoryBackend};
pub use conversation::{ConversationMemory, MemoryConfig, MemoryStats};
pub use durable::DurableMemory;
