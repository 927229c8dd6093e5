//! The buffer proper: ordered log + index behind a reader-writer discipline.
//!
//! `append` and `drain` are the only mutations and exclude each other;
//! readers observe a consistent snapshot (no torn entries, no gaps below
//! the returned cursor).

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use lakesync_clock::HlcClock;
use lakesync_core::constants;
use lakesync_core::errors::SyncResult;
use lakesync_core::models::delta::{RowDelta, Scalar};
use lakesync_core::models::hlc::HlcTimestamp;

use crate::index::RowIndex;

/// Size and age bounds of one buffer.
#[derive(Debug, Clone)]
pub struct BufferConfig {
    pub max_bytes: u64,
    pub max_age_ms: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_bytes: constants::MAX_BUFFER_BYTES,
            max_age_ms: constants::MAX_BUFFER_AGE_MS,
        }
    }
}

/// One accepted delta with its gateway arrival timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferEntry {
    pub delta: RowDelta,
    pub arrived_at_hlc: HlcTimestamp,
}

/// Result of an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended { arrived_at: HlcTimestamp },
    /// The delta id is already in the log; nothing changed.
    Duplicate,
}

/// One page of log entries after a cursor.
#[derive(Debug, Clone)]
pub struct EventPage {
    pub entries: Vec<BufferEntry>,
    pub next_cursor: HlcTimestamp,
    pub has_more: bool,
}

/// Point-in-time buffer measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    pub log_size: usize,
    pub index_size: usize,
    pub byte_estimate: u64,
    pub oldest_arrival: Option<HlcTimestamp>,
}

#[derive(Default)]
struct Inner {
    log: Vec<BufferEntry>,
    /// Delta ids currently in the log; the dedup window.
    live_ids: HashSet<String>,
    index: RowIndex,
    byte_estimate: u64,
}

/// The gateway's delta buffer.
///
/// Shares the gateway's HLC: arrival timestamps are emitted by that clock
/// after observing the delta's own timestamp, so the log order is total and
/// strictly increasing.
pub struct DeltaBuffer {
    clock: Arc<HlcClock>,
    config: BufferConfig,
    inner: RwLock<Inner>,
}

impl DeltaBuffer {
    pub fn new(clock: Arc<HlcClock>, config: BufferConfig) -> Self {
        DeltaBuffer {
            clock,
            config,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Append one delta, assigning its arrival timestamp and merging it
    /// into the row index. Duplicate ids are acknowledged without effect.
    pub fn append(&self, delta: RowDelta) -> SyncResult<AppendOutcome> {
        let mut inner = self.write();
        if inner.live_ids.contains(&delta.delta_id) {
            debug!(delta_id = %delta.delta_id, "duplicate delta ignored");
            return Ok(AppendOutcome::Duplicate);
        }

        self.clock.observe(delta.hlc)?;
        let arrived_at = self.clock.now()?;

        inner.byte_estimate += delta.byte_estimate();
        inner.live_ids.insert(delta.delta_id.clone());
        inner.index.apply(&delta);
        inner.log.push(BufferEntry {
            delta,
            arrived_at_hlc: arrived_at,
        });
        Ok(AppendOutcome::Appended { arrived_at })
    }

    /// Up to `limit` log entries with `arrived_at_hlc > cursor`, in log
    /// order. The returned cursor is the arrival of the last entry, or the
    /// input cursor when the page is empty.
    pub fn get_events_since(&self, cursor: HlcTimestamp, limit: u32) -> EventPage {
        let inner = self.read();
        let start = inner
            .log
            .partition_point(|entry| entry.arrived_at_hlc <= cursor);
        let end = (start + limit as usize).min(inner.log.len());
        let entries: Vec<BufferEntry> = inner.log[start..end].to_vec();
        let next_cursor = entries
            .last()
            .map(|e| e.arrived_at_hlc)
            .unwrap_or(cursor);
        EventPage {
            next_cursor,
            has_more: end < inner.log.len(),
            entries,
        }
    }

    /// The merged projection of one row; `None` when unknown or tombstoned.
    pub fn latest_state(&self, table: &str, row_id: &str) -> Option<BTreeMap<String, Scalar>> {
        self.read().index.latest_state(table, row_id)
    }

    /// Atomically transfer the log to the caller, leaving the index intact.
    pub fn drain(&self) -> Vec<BufferEntry> {
        let mut inner = self.write();
        inner.live_ids.clear();
        inner.byte_estimate = 0;
        std::mem::take(&mut inner.log)
    }

    /// Put a drained batch back at the log head after a failed flush,
    /// preserving arrival order ahead of anything appended since.
    pub fn restore_front(&self, mut batch: Vec<BufferEntry>) {
        if batch.is_empty() {
            return;
        }
        let mut inner = self.write();
        for entry in &batch {
            inner.live_ids.insert(entry.delta.delta_id.clone());
            inner.byte_estimate += entry.delta.byte_estimate();
        }
        let appended_since = std::mem::take(&mut inner.log);
        batch.extend(appended_since);
        inner.log = batch;
    }

    pub fn stats(&self) -> BufferStats {
        let inner = self.read();
        BufferStats {
            log_size: inner.log.len(),
            index_size: inner.index.len(),
            byte_estimate: inner.byte_estimate,
            oldest_arrival: inner.log.first().map(|e| e.arrived_at_hlc),
        }
    }

    /// Occupancy ratio against the byte bound.
    pub fn pressure(&self) -> f64 {
        if self.config.max_bytes == 0 {
            return 1.0;
        }
        self.read().byte_estimate as f64 / self.config.max_bytes as f64
    }

    /// Whether the byte bound is met or exceeded.
    pub fn is_full(&self) -> bool {
        self.read().byte_estimate >= self.config.max_bytes
    }

    /// Whether a size or age trigger asks for a flush.
    pub fn needs_flush(&self, wall_now_ms: u64) -> bool {
        let inner = self.read();
        if inner.byte_estimate >= self.config.max_bytes {
            return true;
        }
        match inner.log.first() {
            Some(first) => first.arrived_at_hlc.wall_ms() + self.config.max_age_ms <= wall_now_ms,
            None => false,
        }
    }

    /// Bound the index after flushes; evicts coldest rows beyond the cap.
    pub fn prune_index(&self, max_rows: usize) -> usize {
        let evicted = self.write().index.prune_to(max_rows);
        if evicted > 0 {
            debug!(evicted, "pruned merge index");
        }
        evicted
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use test_fixtures::{hlc, insert, text, update, ManualWallClock};

    use super::*;
    use lakesync_core::traits::WallClock;

    fn buffer_at(ms: u64) -> (DeltaBuffer, Arc<ManualWallClock>) {
        let wall = ManualWallClock::at(ms);
        let clock = Arc::new(HlcClock::new(wall.clone()));
        (DeltaBuffer::new(clock, BufferConfig::default()), wall)
    }

    #[test]
    fn append_assigns_increasing_arrivals() {
        let (buffer, _wall) = buffer_at(10_000);
        let a = buffer
            .append(insert("t", "r1", "a", hlc(9_000, 0), &[("x", text("1"))]))
            .unwrap();
        let b = buffer
            .append(insert("t", "r2", "a", hlc(9_500, 0), &[("x", text("2"))]))
            .unwrap();
        let (AppendOutcome::Appended { arrived_at: first }, AppendOutcome::Appended { arrived_at: second }) =
            (a, b)
        else {
            panic!("expected two appends");
        };
        assert!(second > first);
    }

    #[test]
    fn duplicate_id_is_acknowledged_without_effect() {
        let (buffer, _wall) = buffer_at(10_000);
        let d = insert("t", "r1", "a", hlc(9_000, 0), &[("x", text("1"))]);
        buffer.append(d.clone()).unwrap();
        let outcome = buffer.append(d).unwrap();
        assert_eq!(outcome, AppendOutcome::Duplicate);
        assert_eq!(buffer.stats().log_size, 1);
    }

    #[test]
    fn pagination_walks_the_log_in_order() {
        let (buffer, _wall) = buffer_at(10_000);
        for i in 0..10 {
            buffer
                .append(insert(
                    "t",
                    &format!("r{i}"),
                    "a",
                    hlc(9_000 + i, 0),
                    &[("x", text("v"))],
                ))
                .unwrap();
        }

        let first = buffer.get_events_since(HlcTimestamp::ZERO, 4);
        assert_eq!(first.entries.len(), 4);
        assert!(first.has_more);

        let second = buffer.get_events_since(first.next_cursor, 100);
        assert_eq!(second.entries.len(), 6);
        assert!(!second.has_more);
        assert!(second.entries[0].arrived_at_hlc > first.next_cursor);
    }

    #[test]
    fn empty_page_returns_input_cursor() {
        let (buffer, _wall) = buffer_at(10_000);
        let cursor = hlc(99_999, 0);
        let page = buffer.get_events_since(cursor, 10);
        assert!(page.entries.is_empty());
        assert_eq!(page.next_cursor, cursor);
        assert!(!page.has_more);
    }

    #[test]
    fn drain_clears_log_but_keeps_index() {
        let (buffer, _wall) = buffer_at(10_000);
        buffer
            .append(update("t", "r1", "a", hlc(9_000, 0), &[("x", text("v"))]))
            .unwrap();
        let drained = buffer.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(buffer.stats().log_size, 0);
        assert_eq!(buffer.stats().byte_estimate, 0);
        assert!(buffer.latest_state("t", "r1").is_some());
    }

    #[test]
    fn restore_front_preserves_arrival_order() {
        let (buffer, _wall) = buffer_at(10_000);
        buffer
            .append(insert("t", "r1", "a", hlc(9_000, 0), &[("x", text("1"))]))
            .unwrap();
        let drained = buffer.drain();

        buffer
            .append(insert("t", "r2", "a", hlc(9_100, 0), &[("x", text("2"))]))
            .unwrap();
        buffer.restore_front(drained);

        let page = buffer.get_events_since(HlcTimestamp::ZERO, 10);
        assert_eq!(page.entries.len(), 2);
        assert!(page.entries[0].arrived_at_hlc < page.entries[1].arrived_at_hlc);
        assert_eq!(page.entries[0].delta.row_id, "r1");
    }

    #[test]
    fn age_trigger_fires_once_oldest_entry_expires() {
        let wall = ManualWallClock::at(10_000);
        let clock = Arc::new(HlcClock::new(wall.clone()));
        let buffer = DeltaBuffer::new(
            clock,
            BufferConfig {
                max_bytes: u64::MAX,
                max_age_ms: 5_000,
            },
        );
        buffer
            .append(insert("t", "r1", "a", hlc(10_000, 0), &[("x", text("v"))]))
            .unwrap();
        assert!(!buffer.needs_flush(wall.now_ms()));
        wall.advance(6_000);
        assert!(buffer.needs_flush(wall.now_ms()));
    }

    #[test]
    fn byte_trigger_fires_at_the_bound() {
        let wall = ManualWallClock::at(10_000);
        let clock = Arc::new(HlcClock::new(wall));
        let buffer = DeltaBuffer::new(
            clock,
            BufferConfig {
                max_bytes: 64,
                max_age_ms: u64::MAX,
            },
        );
        buffer
            .append(insert("t", "r1", "a", hlc(10_000, 0), &[("x", text("some text"))]))
            .unwrap();
        assert!(buffer.is_full());
        assert!(buffer.pressure() >= 1.0);
    }
}
