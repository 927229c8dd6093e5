//! # lakesync-rules
//!
//! The sync-rules evaluator: a pure, deterministic filter the gateway
//! applies to pull pages. Rules are grouped into named buckets; a delta is
//! visible to a caller when it matches at least one bucket under the
//! caller's resolved claims. Missing claims fail closed; operator/type
//! mismatches make the filter non-matching rather than erroring.

mod config;
mod eval;

pub use config::{Bucket, Filter, FilterOp, FilterValue, SyncRules};
pub use eval::{filter_deltas, matches_delta};
