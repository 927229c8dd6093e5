//! # lakesync-codec
//!
//! Canonicalises row deltas for hashing and wire transport.
//!
//! Two encodings share one value space:
//! - **canonical JSON**: the hashing form behind `delta_id`; byte-stable
//!   across processes and implementations;
//! - **wire framing**: length-prefixed tagged binary for push/pull payloads
//!   and the persisted buffer log, with HLCs as big-endian u64.

mod canonical;
mod delta_id;
pub mod wire;

pub use canonical::canonical_json;
pub use delta_id::{compute_delta_id, seal, verify_delta_id};
