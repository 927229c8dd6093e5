//! # lakesync-outbox
//!
//! The per-client outbox: a FIFO queue of locally-produced deltas awaiting
//! gateway acknowledgement. `ack` is the only operation that removes an
//! entry; everything else moves entries between `pending` and `sending`
//! while preserving retry counts, including across a crash/restart for the
//! durable implementation.

mod memory;
mod sqlite;

pub use memory::MemoryOutbox;
pub use sqlite::SqliteOutbox;

use lakesync_core::errors::SyncResult;
use lakesync_core::models::delta::RowDelta;

/// Delivery state of one outbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxState {
    Pending,
    Sending,
}

impl OutboxState {
    pub fn as_str(self) -> &'static str {
        match self {
            OutboxState::Pending => "pending",
            OutboxState::Sending => "sending",
        }
    }
}

/// One queued delta with its local id and retry accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEntry {
    pub id: u64,
    pub delta: RowDelta,
    pub retry_count: u32,
    pub state: OutboxState,
}

/// The outbox contract.
///
/// `peek` returns FIFO by enqueue id. Entries whose retry count passes the
/// configured bound are surfaced by `nack` but never silently dropped.
pub trait Outbox: Send + Sync {
    /// Enqueue a delta as `pending` with a zero retry count.
    fn push(&self, delta: RowDelta) -> SyncResult<u64>;

    /// Up to `n` oldest `pending` entries.
    fn peek(&self, n: usize) -> SyncResult<Vec<OutboxEntry>>;

    /// Flip entries `pending` → `sending`.
    fn mark_sending(&self, ids: &[u64]) -> SyncResult<()>;

    /// Remove acknowledged entries.
    fn ack(&self, ids: &[u64]) -> SyncResult<()>;

    /// Flip entries `sending` → `pending` and bump their retry counts.
    /// Returns the entries that have now exceeded the retry bound.
    fn nack(&self, ids: &[u64]) -> SyncResult<Vec<OutboxEntry>>;

    /// Count of entries not yet acknowledged.
    fn depth(&self) -> SyncResult<usize>;
}
