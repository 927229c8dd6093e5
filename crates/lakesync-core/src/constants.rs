/// Lakesync system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum tolerated distance between a delta's wall-clock component and the
/// gateway's wall clock, in milliseconds.
pub const MAX_DRIFT_MS: u64 = 5_000;

/// Maximum bytes buffered per gateway before pushes are rejected.
pub const MAX_BUFFER_BYTES: u64 = 500 * 1024 * 1024;

/// Maximum age of the oldest buffered entry before a flush is triggered.
pub const MAX_BUFFER_AGE_MS: u64 = 60_000;

/// Default page size for outbox drains and pull requests.
pub const PAGE_SIZE: u32 = 100;

/// Maximum retries per outbox entry before it is surfaced to the caller.
pub const MAX_RETRIES: u32 = 5;

/// Maximum adapter write attempts before the flush pipeline goes degraded.
pub const MAX_FLUSH_RETRIES: u32 = 8;

/// Buffer occupancy ratio at which push responses start carrying
/// backpressure hints.
pub const BUFFER_PRESSURE_THRESHOLD: f64 = 0.8;

/// On-disk buffer log format version.
pub const BUFFER_LOG_VERSION: u8 = 1;
