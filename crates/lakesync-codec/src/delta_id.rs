//! Deterministic delta fingerprinting.
//!
//! `delta_id` is the first 16 bytes of the SHA-256 of the canonical JSON,
//! rendered as 32 lowercase hex characters. The same logical change always
//! hashes to the same id, on every conforming implementation.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use lakesync_core::errors::{CodecError, SyncResult};
use lakesync_core::models::delta::RowDelta;

use crate::canonical::canonical_json;

/// Number of digest bytes kept in the id (32 hex characters).
const ID_BYTES: usize = 16;

/// Compute the delta id over the canonical encoding, ignoring whatever the
/// delta's `delta_id` field currently holds.
pub fn compute_delta_id(delta: &RowDelta) -> String {
    let digest = Sha256::digest(canonical_json(delta).as_bytes());
    let mut id = String::with_capacity(ID_BYTES * 2);
    for byte in &digest[..ID_BYTES] {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

/// Fill in the delta's id from its content and return it.
pub fn seal(mut delta: RowDelta) -> RowDelta {
    delta.delta_id = compute_delta_id(&delta);
    delta
}

/// Verify a transmitted id against the recomputed one.
pub fn verify_delta_id(delta: &RowDelta) -> SyncResult<()> {
    let recomputed = compute_delta_id(delta);
    if delta.delta_id == recomputed {
        Ok(())
    } else {
        Err(CodecError::HashMismatch {
            transmitted: delta.delta_id.clone(),
            recomputed,
        }
        .into())
    }
}
