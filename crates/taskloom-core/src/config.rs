//! Runtime configuration values.
//!
//! These are plain settings consumed by whoever constructs the runtime;
//! parsing them from the environment or a config file is an adapter concern.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration surface for the taskloom runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RuntimeConfig {
    /// Maximum messages retained per memory session before FIFO eviction
    pub memory_capacity: usize,

    /// TTL in seconds applied by durable memory backends that support expiry
    pub durable_ttl_secs: u64,

    /// Optional per-invocation tool timeout in seconds.
    ///
    /// The core does not enforce this; adapters wrapping `invoke` may.
    pub tool_timeout_secs: Option<u64>,

    /// How long a canceled task's in-flight processing is allowed to keep
    /// running before the `Canceled` terminal event is emitted regardless.
    pub cancel_grace_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            memory_capacity: 100,
            durable_ttl_secs: 3600,
            tool_timeout_secs: None,
            cancel_grace_ms: 250,
        }
    }
}

impl RuntimeConfig {
    /// The cancellation grace period as a [`Duration`]
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }
}
