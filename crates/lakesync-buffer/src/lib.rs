//! # lakesync-buffer
//!
//! The gateway's in-memory holding area for accepted deltas: an append-only
//! log ordered by arrival timestamp, plus a per-row merge index giving the
//! last-writer-wins projection of everything seen so far. The log feeds
//! pulls and the flush pipeline; the index answers `latest_state` and
//! deduplicates merges.

mod buffer;
pub mod index;

pub use buffer::{AppendOutcome, BufferConfig, BufferEntry, BufferStats, DeltaBuffer, EventPage};
pub use index::{ColumnWrite, RowIndex, RowKey};
