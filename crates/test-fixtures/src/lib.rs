//! Shared test builders for the lakesync workspace.
//!
//! Deltas built here are sealed (their `delta_id` is computed), so they are
//! valid against strict decoding and buffer deduplication.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lakesync_codec::seal;
use lakesync_core::models::delta::{ColumnValue, DeltaOp, RowDelta, Scalar};
use lakesync_core::models::hlc::HlcTimestamp;
use lakesync_core::models::protocol::ClaimsContext;
use lakesync_core::traits::clock::WallClock;

/// A wall clock scripted by the test.
pub struct ManualWallClock(AtomicU64);

impl ManualWallClock {
    pub fn at(ms: u64) -> Arc<Self> {
        Arc::new(ManualWallClock(AtomicU64::new(ms)))
    }

    pub fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl WallClock for ManualWallClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Packed HLC from a `(wall_ms, counter)` pair.
pub fn hlc(wall_ms: u64, counter: u16) -> HlcTimestamp {
    HlcTimestamp::from_parts(wall_ms, counter)
}

/// A sealed delta with the given op and columns.
pub fn delta(
    op: DeltaOp,
    table: &str,
    row_id: &str,
    client_id: &str,
    at: HlcTimestamp,
    columns: &[(&str, Scalar)],
) -> RowDelta {
    seal(RowDelta {
        op,
        table: table.into(),
        row_id: row_id.into(),
        client_id: client_id.into(),
        hlc: at,
        columns: columns
            .iter()
            .map(|(name, value)| ColumnValue::new(*name, value.clone()))
            .collect(),
        delta_id: String::new(),
    })
}

pub fn insert(
    table: &str,
    row_id: &str,
    client_id: &str,
    at: HlcTimestamp,
    columns: &[(&str, Scalar)],
) -> RowDelta {
    delta(DeltaOp::Insert, table, row_id, client_id, at, columns)
}

pub fn update(
    table: &str,
    row_id: &str,
    client_id: &str,
    at: HlcTimestamp,
    columns: &[(&str, Scalar)],
) -> RowDelta {
    delta(DeltaOp::Update, table, row_id, client_id, at, columns)
}

pub fn delete(table: &str, row_id: &str, client_id: &str, at: HlcTimestamp) -> RowDelta {
    delta(DeltaOp::Delete, table, row_id, client_id, at, &[])
}

/// Shorthand scalar constructors.
pub fn text(s: &str) -> Scalar {
    Scalar::Text(s.into())
}

pub fn int(n: i64) -> Scalar {
    Scalar::I64(n)
}

pub fn boolean(b: bool) -> Scalar {
    Scalar::Bool(b)
}

/// A claims context from literal pairs.
pub fn claims(pairs: &[(&str, serde_json::Value)]) -> ClaimsContext {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
