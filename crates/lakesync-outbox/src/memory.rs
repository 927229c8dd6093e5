//! In-memory outbox for tests and ephemeral clients.

use std::collections::BTreeMap;
use std::sync::Mutex;

use lakesync_core::constants;
use lakesync_core::errors::SyncResult;
use lakesync_core::models::delta::RowDelta;

use crate::{Outbox, OutboxEntry, OutboxState};

#[derive(Default)]
struct Inner {
    entries: BTreeMap<u64, OutboxEntry>,
    next_id: u64,
}

/// Outbox held entirely in process memory.
pub struct MemoryOutbox {
    inner: Mutex<Inner>,
    max_retries: u32,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::with_max_retries(constants::MAX_RETRIES)
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        MemoryOutbox {
            inner: Mutex::new(Inner::default()),
            max_retries,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryOutbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Outbox for MemoryOutbox {
    fn push(&self, delta: RowDelta) -> SyncResult<u64> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.entries.insert(
            id,
            OutboxEntry {
                id,
                delta,
                retry_count: 0,
                state: OutboxState::Pending,
            },
        );
        Ok(id)
    }

    fn peek(&self, n: usize) -> SyncResult<Vec<OutboxEntry>> {
        let inner = self.lock();
        Ok(inner
            .entries
            .values()
            .filter(|e| e.state == OutboxState::Pending)
            .take(n)
            .cloned()
            .collect())
    }

    fn mark_sending(&self, ids: &[u64]) -> SyncResult<()> {
        let mut inner = self.lock();
        for id in ids {
            if let Some(entry) = inner.entries.get_mut(id) {
                if entry.state == OutboxState::Pending {
                    entry.state = OutboxState::Sending;
                }
            }
        }
        Ok(())
    }

    fn ack(&self, ids: &[u64]) -> SyncResult<()> {
        let mut inner = self.lock();
        for id in ids {
            inner.entries.remove(id);
        }
        Ok(())
    }

    fn nack(&self, ids: &[u64]) -> SyncResult<Vec<OutboxEntry>> {
        let mut inner = self.lock();
        let mut exceeded = Vec::new();
        for id in ids {
            if let Some(entry) = inner.entries.get_mut(id) {
                if entry.state == OutboxState::Sending {
                    entry.state = OutboxState::Pending;
                    entry.retry_count += 1;
                    if entry.retry_count > self.max_retries {
                        exceeded.push(entry.clone());
                    }
                }
            }
        }
        Ok(exceeded)
    }

    fn depth(&self) -> SyncResult<usize> {
        Ok(self.lock().entries.len())
    }
}

#[cfg(test)]
mod tests {
    use test_fixtures::{hlc, insert, text};

    use super::*;

    fn entry(row: &str) -> RowDelta {
        insert("t", row, "c", hlc(1_000, 0), &[("x", text("v"))])
    }

    #[test]
    fn peek_is_fifo_and_skips_sending() {
        let outbox = MemoryOutbox::new();
        let first = outbox.push(entry("r1")).unwrap();
        outbox.push(entry("r2")).unwrap();
        outbox.push(entry("r3")).unwrap();

        outbox.mark_sending(&[first]).unwrap();
        let peeked = outbox.peek(10).unwrap();
        assert_eq!(peeked.len(), 2);
        assert_eq!(peeked[0].delta.row_id, "r2");
        assert_eq!(peeked[1].delta.row_id, "r3");
    }

    #[test]
    fn only_ack_removes() {
        let outbox = MemoryOutbox::new();
        let id = outbox.push(entry("r1")).unwrap();
        outbox.mark_sending(&[id]).unwrap();
        outbox.nack(&[id]).unwrap();
        assert_eq!(outbox.depth().unwrap(), 1);

        outbox.ack(&[id]).unwrap();
        assert_eq!(outbox.depth().unwrap(), 0);
    }

    #[test]
    fn nack_surfaces_exhausted_entries_without_dropping() {
        let outbox = MemoryOutbox::with_max_retries(2);
        let id = outbox.push(entry("r1")).unwrap();

        for round in 1..=3u32 {
            outbox.mark_sending(&[id]).unwrap();
            let exceeded = outbox.nack(&[id]).unwrap();
            if round <= 2 {
                assert!(exceeded.is_empty(), "round {round} should be under the bound");
            } else {
                assert_eq!(exceeded.len(), 1);
                assert_eq!(exceeded[0].retry_count, 3);
            }
        }
        // Still queued; surfacing is not dropping.
        assert_eq!(outbox.depth().unwrap(), 1);
    }
}
