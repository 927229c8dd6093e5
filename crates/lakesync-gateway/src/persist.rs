//! Optional on-disk buffer persistence for crash recovery.
//!
//! Layout: a fixed header (format version, gateway id, creation time) then
//! a sequence of `[u32 length | wire-encoded delta]` frames. Files are
//! named `buffer-{arrivedAtHlcOfFirstEntry}.log`.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use lakesync_buffer::BufferEntry;
use lakesync_codec::wire;
use lakesync_core::constants::BUFFER_LOG_VERSION;
use lakesync_core::errors::{CodecError, StorageError, SyncResult};
use lakesync_core::models::delta::RowDelta;

/// Header of one persisted buffer log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferLogHeader {
    pub version: u8,
    pub gateway_id: String,
    pub created_at_ms: i64,
}

/// Persist a drained (or about-to-drain) log under `dir`. Returns the
/// written path.
pub fn write_buffer_log(
    dir: &Path,
    gateway_id: &str,
    entries: &[BufferEntry],
) -> SyncResult<PathBuf> {
    let first_arrival = entries
        .first()
        .map(|e| e.arrived_at_hlc.as_u64())
        .unwrap_or_default();
    let path = dir.join(format!("buffer-{first_arrival}.log"));

    let mut out = Vec::with_capacity(64 + entries.len() * 64);
    out.push(BUFFER_LOG_VERSION);
    out.extend_from_slice(&(gateway_id.len() as u32).to_be_bytes());
    out.extend_from_slice(gateway_id.as_bytes());
    out.extend_from_slice(&Utc::now().timestamp_millis().to_be_bytes());
    for entry in entries {
        out.extend_from_slice(&wire::encode_frame(&entry.delta));
    }

    let mut file = fs::File::create(&path).map_err(io_err)?;
    file.write_all(&out).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    debug!(path = %path.display(), entries = entries.len(), "wrote buffer log");
    Ok(path)
}

/// Read a persisted buffer log back: header plus deltas in log order.
pub fn read_buffer_log(path: &Path) -> SyncResult<(BufferLogHeader, Vec<RowDelta>)> {
    let bytes = fs::read(path).map_err(io_err)?;
    if bytes.len() < 13 {
        return Err(CodecError::Truncated {
            needed: 13 - bytes.len(),
            remaining: bytes.len(),
        }
        .into());
    }

    let version = bytes[0];
    let id_len = u32::from_be_bytes(bytes[1..5].try_into().expect("length checked")) as usize;
    let id_end = 5 + id_len;
    if bytes.len() < id_end + 8 {
        return Err(CodecError::Truncated {
            needed: id_end + 8 - bytes.len(),
            remaining: bytes.len(),
        }
        .into());
    }
    let gateway_id = String::from_utf8(bytes[5..id_end].to_vec())
        .map_err(|_| CodecError::InvalidUtf8 { field: "gatewayId" })?;
    let created_at_ms = i64::from_be_bytes(
        bytes[id_end..id_end + 8]
            .try_into()
            .expect("length checked"),
    );

    let mut deltas = Vec::new();
    let mut rest = &bytes[id_end + 8..];
    while !rest.is_empty() {
        let (delta, used) = wire::decode_frame(rest)?;
        deltas.push(delta);
        rest = &rest[used..];
    }

    Ok((
        BufferLogHeader {
            version,
            gateway_id,
            created_at_ms,
        },
        deltas,
    ))
}

fn io_err(e: std::io::Error) -> StorageError {
    StorageError::Storage {
        reason: e.to_string(),
    }
}
