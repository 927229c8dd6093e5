//! Configuration for one client-side sync coordinator.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Tuning for the client push/pull cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Deltas per outbox drain and per pull request. Default: 100.
    pub page_size: u32,
    /// Consecutive transport failures tolerated before a cycle gives up;
    /// also the per-entry retry bound surfaced by the outbox. Default: 5.
    pub max_retries: u32,
    /// First retry delay; doubles per attempt. Default: 200 ms.
    pub backoff_base_ms: u64,
    /// Cap on the retry delay. Default: 10 000 ms.
    pub backoff_max_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_size: constants::PAGE_SIZE,
            max_retries: constants::MAX_RETRIES,
            backoff_base_ms: 200,
            backoff_max_ms: 10_000,
        }
    }
}
