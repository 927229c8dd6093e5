//! Configuration for one gateway instance.
//!
//! # Examples
//!
//! ```
//! use lakesync_core::config::GatewayConfig;
//!
//! let config = GatewayConfig::default();
//! assert_eq!(config.max_drift_ms, 5_000);
//! assert_eq!(config.max_buffer_bytes, 500 * 1024 * 1024);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants;

/// Limits and tuning for the gateway core and its flush pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Maximum wall-clock drift accepted on pushed deltas. Default: 5 000 ms.
    pub max_drift_ms: u64,
    /// Buffer byte bound; pushes fail with `BUFFER_FULL` beyond it.
    /// Default: 500 MiB.
    pub max_buffer_bytes: u64,
    /// Oldest-entry age that triggers a flush. Default: 60 000 ms.
    pub max_buffer_age_ms: u64,
    /// Adapter write attempts before the flush state goes degraded.
    /// Default: 8.
    pub max_flush_retries: u32,
    /// First flush retry delay; doubles per attempt. Default: 250 ms.
    pub flush_backoff_base_ms: u64,
    /// Cap on the flush retry delay. Default: 30 000 ms.
    pub flush_backoff_max_ms: u64,
    /// Occupancy ratio past which push responses carry pressure hints.
    /// Default: 0.8.
    pub pressure_threshold: f64,
    /// Row-index entries retained after flush before oldest rows are pruned.
    /// Default: 1 000 000.
    pub max_index_entries: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_drift_ms: constants::MAX_DRIFT_MS,
            max_buffer_bytes: constants::MAX_BUFFER_BYTES,
            max_buffer_age_ms: constants::MAX_BUFFER_AGE_MS,
            max_flush_retries: constants::MAX_FLUSH_RETRIES,
            flush_backoff_base_ms: 250,
            flush_backoff_max_ms: 30_000,
            pressure_threshold: constants::BUFFER_PRESSURE_THRESHOLD,
            max_index_entries: 1_000_000,
        }
    }
}
