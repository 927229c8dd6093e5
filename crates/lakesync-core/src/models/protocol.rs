//! Push/pull/flush wire contracts.
//!
//! The transport layer (HTTP, WebSocket, in-process loopback) carries these
//! types verbatim; the gateway and client agree on them and nothing else.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::delta::RowDelta;
use super::hlc::HlcTimestamp;
use crate::errors::ErrorCode;

/// Resolved claims handed to the gateway at pull time.
///
/// The transport/control plane verifies tokens; the sync plane only ever
/// sees the resolved mapping.
pub type ClaimsContext = BTreeMap<String, serde_json::Value>;

/// A batch of deltas pushed by one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    pub client_id: String,
    pub deltas: Vec<RowDelta>,
    pub last_seen_hlc: HlcTimestamp,
    /// Absolute wall-clock deadline in epoch milliseconds. A gateway that
    /// reads this after expiry rejects the batch before mutating state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

/// Gateway acknowledgement of an accepted push batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    pub server_hlc: HlcTimestamp,
    pub accepted: u32,
    /// Buffer occupancy ratio, present once the gateway crosses its
    /// pressure threshold. Clients treat it as a back-off hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_pressure: Option<f64>,
}

/// A client's request for deltas after its cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub client_id: String,
    pub since_hlc: HlcTimestamp,
    pub max_deltas: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<ClaimsContext>,
}

/// One page of the gateway log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    pub deltas: Vec<RowDelta>,
    /// Log position cursor: the arrival timestamp of the last entry the
    /// gateway examined, regardless of filtering.
    pub next_cursor: HlcTimestamp,
    pub has_more: bool,
}

/// Admin request to flush one gateway's buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushRequest {
    pub gateway_id: String,
}

/// Outcome of a flush run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushReport {
    pub batches_flushed: u32,
    pub bytes_flushed: u64,
}

/// Typed error surface of every sync-plane operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}
