//! The fundamental change record: a column-level row delta.

use serde::{Deserialize, Serialize};

use super::hlc::HlcTimestamp;

/// The kind of row mutation a delta carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeltaOp {
    Insert,
    Update,
    Delete,
}

impl DeltaOp {
    /// Stable wire name, also used by the canonical encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaOp::Insert => "INSERT",
            DeltaOp::Update => "UPDATE",
            DeltaOp::Delete => "DELETE",
        }
    }
}

/// A column value. The scalar space is closed: every value a delta can carry
/// is one of these variants, and the codec round-trips each of them exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Scalar {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl Scalar {
    /// Short human name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::I64(_) => "i64",
            Scalar::F64(_) => "f64",
            Scalar::Text(_) => "string",
            Scalar::Bytes(_) => "bytes",
            Scalar::Json(_) => "json",
        }
    }

    /// Rough in-memory footprint, used for buffer byte accounting.
    pub fn byte_estimate(&self) -> u64 {
        match self {
            Scalar::Null | Scalar::Bool(_) => 1,
            Scalar::I64(_) | Scalar::F64(_) => 8,
            Scalar::Text(s) => s.len() as u64,
            Scalar::Bytes(b) => b.len() as u64,
            Scalar::Json(v) => v.to_string().len() as u64,
        }
    }
}

/// A named column paired with its new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnValue {
    pub column: String,
    pub value: Scalar,
}

impl ColumnValue {
    pub fn new(column: impl Into<String>, value: Scalar) -> Self {
        ColumnValue {
            column: column.into(),
            value,
        }
    }
}

/// The `(hlc, client_id)` coordinate that decides last-writer-wins merges.
///
/// The derived ordering is the merge ordering: strictly greater HLC wins,
/// equal HLCs fall back to the lexicographically greater client id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WriteCoordinate {
    pub hlc: HlcTimestamp,
    pub client_id: String,
}

impl WriteCoordinate {
    pub fn new(hlc: HlcTimestamp, client_id: impl Into<String>) -> Self {
        WriteCoordinate {
            hlc,
            client_id: client_id.into(),
        }
    }
}

/// An atomic row-level change record.
///
/// `delta_id` is the deterministic fingerprint of the logical change
/// (computed by `lakesync-codec` over the canonical encoding); two deltas
/// with the same id are the same event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDelta {
    pub op: DeltaOp,
    pub table: String,
    pub row_id: String,
    pub client_id: String,
    pub hlc: HlcTimestamp,
    /// Affected columns and their new values. Empty for `DELETE`.
    pub columns: Vec<ColumnValue>,
    pub delta_id: String,
}

impl RowDelta {
    /// The merge coordinate of this delta.
    pub fn coordinate(&self) -> WriteCoordinate {
        WriteCoordinate::new(self.hlc, self.client_id.clone())
    }

    /// Rough in-memory footprint, used for buffer byte accounting.
    pub fn byte_estimate(&self) -> u64 {
        let columns: u64 = self
            .columns
            .iter()
            .map(|c| c.column.len() as u64 + c.value.byte_estimate())
            .sum();
        // Fixed overhead covers op, hlc, and per-entry bookkeeping.
        48 + self.table.len() as u64
            + self.row_id.len() as u64
            + self.client_id.len() as u64
            + self.delta_id.len() as u64
            + columns
    }
}
