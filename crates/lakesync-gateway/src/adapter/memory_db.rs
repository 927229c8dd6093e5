//! In-memory database adapter.
//!
//! Inserts are idempotent keyed by `delta_id`; the merged row state is the
//! same LWW projection the gateway buffer computes, so a flushed-and-pruned
//! gateway and its adapter agree on every row.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use lakesync_buffer::RowIndex;
use lakesync_core::errors::SyncResult;
use lakesync_core::models::delta::{RowDelta, Scalar};
use lakesync_core::models::hlc::HlcTimestamp;
use lakesync_core::models::schema::TableSchema;
use lakesync_core::traits::adapter::DatabaseAdapter;

#[derive(Default)]
struct Inner {
    schemas: HashMap<String, TableSchema>,
    deltas: Vec<RowDelta>,
    seen: HashSet<String>,
    index: RowIndex,
}

/// A row-store adapter held in process memory.
#[derive(Default)]
pub struct MemoryDatabaseAdapter {
    inner: Mutex<Inner>,
}

impl MemoryDatabaseAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total deltas stored (after dedup), for assertions.
    pub fn delta_count(&self) -> usize {
        self.lock().deltas.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DatabaseAdapter for MemoryDatabaseAdapter {
    async fn ensure_schema(&self, schema: &TableSchema) -> SyncResult<()> {
        self.lock()
            .schemas
            .insert(schema.table.clone(), schema.clone());
        Ok(())
    }

    async fn insert_deltas(&self, deltas: &[RowDelta]) -> SyncResult<()> {
        let mut inner = self.lock();
        for delta in deltas {
            if !inner.seen.insert(delta.delta_id.clone()) {
                continue;
            }
            inner.index.apply(delta);
            inner.deltas.push(delta.clone());
        }
        Ok(())
    }

    async fn query_deltas_since(
        &self,
        hlc: HlcTimestamp,
        tables: Option<&[String]>,
    ) -> SyncResult<Vec<RowDelta>> {
        let inner = self.lock();
        Ok(inner
            .deltas
            .iter()
            .filter(|d| d.hlc > hlc)
            .filter(|d| match tables {
                Some(tables) => tables.iter().any(|t| *t == d.table),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn get_latest_state(
        &self,
        table: &str,
        row_id: &str,
    ) -> SyncResult<Option<BTreeMap<String, Scalar>>> {
        Ok(self.lock().index.latest_state(table, row_id))
    }
}
