//! Per-row merge index.
//!
//! Each column of each row tracks the best-known writer as a
//! `(hlc, client_id)` coordinate; merging keeps the unique maximum under
//! that ordering, which makes application associative, commutative, and
//! idempotent. Deletes are row-level tombstones at the delete's coordinate;
//! writes with strictly greater coordinates resurrect the row column by
//! column.

use std::collections::{BTreeMap, HashMap};

use lakesync_core::models::delta::{DeltaOp, RowDelta, Scalar, WriteCoordinate};

/// `(table, row)` identity of an indexed row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub table: String,
    pub row_id: String,
}

impl RowKey {
    pub fn new(table: impl Into<String>, row_id: impl Into<String>) -> Self {
        RowKey {
            table: table.into(),
            row_id: row_id.into(),
        }
    }
}

/// Best-known write for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnWrite {
    pub coord: WriteCoordinate,
    pub value: Scalar,
}

#[derive(Debug, Default, Clone)]
struct RowState {
    columns: HashMap<String, ColumnWrite>,
    tombstone: Option<WriteCoordinate>,
}

impl RowState {
    /// Greatest coordinate this row has seen, used for pruning order.
    fn newest_coordinate(&self) -> Option<WriteCoordinate> {
        let newest_column = self.columns.values().map(|w| &w.coord).max();
        match (&self.tombstone, newest_column) {
            (Some(t), Some(c)) => Some(t.max(c).clone()),
            (Some(t), None) => Some(t.clone()),
            (None, Some(c)) => Some(c.clone()),
            (None, None) => None,
        }
    }
}

/// The per-row LWW merge index.
#[derive(Debug, Default)]
pub struct RowIndex {
    rows: HashMap<RowKey, RowState>,
}

impl RowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one delta into the index. Idempotent: re-applying any
    /// already-seen delta changes nothing.
    pub fn apply(&mut self, delta: &RowDelta) {
        let key = RowKey::new(delta.table.clone(), delta.row_id.clone());
        let coord = delta.coordinate();
        let row = self.rows.entry(key).or_default();

        match delta.op {
            DeltaOp::Delete => {
                if row.tombstone.as_ref().is_some_and(|t| *t >= coord) {
                    return;
                }
                // New tombstone: drop column writes strictly older than it.
                row.columns.retain(|_, write| write.coord >= coord);
                row.tombstone = Some(coord);
            }
            DeltaOp::Insert | DeltaOp::Update => {
                for col in &delta.columns {
                    // Writes at or below a tombstone are already deleted.
                    if row.tombstone.as_ref().is_some_and(|t| coord <= *t) {
                        continue;
                    }
                    match row.columns.get_mut(&col.column) {
                        Some(existing) if existing.coord >= coord => {}
                        Some(existing) => {
                            existing.coord = coord.clone();
                            existing.value = col.value.clone();
                        }
                        None => {
                            row.columns.insert(
                                col.column.clone(),
                                ColumnWrite {
                                    coord: coord.clone(),
                                    value: col.value.clone(),
                                },
                            );
                        }
                    }
                }
            }
        }
    }

    /// The merged projection of one row, or `None` when the row is unknown
    /// or tombstoned without a later resurrection.
    pub fn latest_state(&self, table: &str, row_id: &str) -> Option<BTreeMap<String, Scalar>> {
        let row = self.rows.get(&RowKey::new(table, row_id))?;
        let visible: BTreeMap<String, Scalar> = row
            .columns
            .iter()
            .filter(|(_, write)| match &row.tombstone {
                Some(t) => write.coord > *t,
                None => true,
            })
            .map(|(name, write)| (name.clone(), write.value.clone()))
            .collect();

        if row.tombstone.is_some() && visible.is_empty() {
            None
        } else {
            Some(visible)
        }
    }

    /// The winning coordinate of one column, if any survives the tombstone.
    pub fn column_coordinate(
        &self,
        table: &str,
        row_id: &str,
        column: &str,
    ) -> Option<&WriteCoordinate> {
        self.rows
            .get(&RowKey::new(table, row_id))
            .and_then(|row| row.columns.get(column))
            .map(|write| &write.coord)
    }

    /// Number of indexed rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop the rows with the oldest newest-write coordinates until at most
    /// `max_rows` remain. Returns how many rows were evicted.
    pub fn prune_to(&mut self, max_rows: usize) -> usize {
        if self.rows.len() <= max_rows {
            return 0;
        }
        let mut ordered: Vec<(RowKey, Option<WriteCoordinate>)> = self
            .rows
            .iter()
            .map(|(key, row)| (key.clone(), row.newest_coordinate()))
            .collect();
        ordered.sort_by(|a, b| a.1.cmp(&b.1));

        let evict = self.rows.len() - max_rows;
        for (key, _) in ordered.into_iter().take(evict) {
            self.rows.remove(&key);
        }
        evict
    }
}
