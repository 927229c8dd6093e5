//! Pure bucket evaluation.
//!
//! Deterministic for fixed inputs and side-effect-free: the only output is
//! the filtered delta list (plus a warning log when a rule is inconsistent
//! with a column's observed type; such filters are non-matching, never
//! hard errors).

use chrono::{DateTime, NaiveDate};
use tracing::warn;

use lakesync_core::models::delta::{RowDelta, Scalar};
use lakesync_core::models::protocol::ClaimsContext;

use crate::config::{Bucket, Filter, FilterOp, FilterValue, SyncRules};

/// Keep the deltas visible to a caller with the given claims.
///
/// With no buckets configured, every delta passes. With buckets, a delta is
/// kept iff it matches at least one (union semantics).
pub fn filter_deltas(
    rules: &SyncRules,
    deltas: Vec<RowDelta>,
    claims: &ClaimsContext,
) -> Vec<RowDelta> {
    if rules.is_empty() {
        return deltas;
    }
    deltas
        .into_iter()
        .filter(|d| matches_delta(rules, d, claims))
        .collect()
}

/// Whether one delta is visible under the rules and claims.
pub fn matches_delta(rules: &SyncRules, delta: &RowDelta, claims: &ClaimsContext) -> bool {
    if rules.is_empty() {
        return true;
    }
    rules
        .buckets
        .iter()
        .any(|bucket| bucket_matches(bucket, delta, claims))
}

fn bucket_matches(bucket: &Bucket, delta: &RowDelta, claims: &ClaimsContext) -> bool {
    bucket.covers_table(&delta.table)
        && bucket
            .filters
            .iter()
            .all(|filter| filter_matches(filter, delta, claims))
}

fn filter_matches(filter: &Filter, delta: &RowDelta, claims: &ClaimsContext) -> bool {
    // A delta that does not carry the filtered column cannot satisfy it.
    let Some(actual) = delta.columns.iter().find(|c| c.column == filter.column) else {
        return false;
    };

    // Missing claims fail closed.
    let rhs = match &filter.value {
        FilterValue::Literal(v) => v,
        FilterValue::Claim(name) => match claims.get(name) {
            Some(v) => v,
            None => return false,
        },
    };

    match apply_op(filter.op, &actual.value, rhs) {
        Ok(matched) => matched,
        Err(reason) => {
            warn!(
                column = %filter.column,
                op = ?filter.op,
                %reason,
                "invalid rule, treating delta as non-matching"
            );
            false
        }
    }
}

fn apply_op(op: FilterOp, actual: &Scalar, rhs: &serde_json::Value) -> Result<bool, String> {
    match op {
        FilterOp::Eq => Ok(loose_eq(actual, rhs)),
        FilterOp::Neq => Ok(!loose_eq(actual, rhs)),
        FilterOp::In => match rhs {
            serde_json::Value::Array(items) => Ok(items.iter().any(|v| loose_eq(actual, v))),
            _ => Err("`in` expects an array right-hand side".into()),
        },
        FilterOp::Gt | FilterOp::Lt | FilterOp::Gte | FilterOp::Lte => {
            let ordering = compare(actual, rhs)?;
            Ok(match op {
                FilterOp::Gt => ordering == std::cmp::Ordering::Greater,
                FilterOp::Lt => ordering == std::cmp::Ordering::Less,
                FilterOp::Gte => ordering != std::cmp::Ordering::Less,
                FilterOp::Lte => ordering != std::cmp::Ordering::Greater,
                _ => unreachable!(),
            })
        }
    }
}

fn loose_eq(actual: &Scalar, rhs: &serde_json::Value) -> bool {
    match (actual, rhs) {
        (Scalar::Null, serde_json::Value::Null) => true,
        (Scalar::Bool(a), serde_json::Value::Bool(b)) => a == b,
        (Scalar::I64(a), serde_json::Value::Number(n)) => match n.as_i64() {
            Some(b) => *a == b,
            None => n.as_f64().is_some_and(|b| *a as f64 == b),
        },
        (Scalar::F64(a), serde_json::Value::Number(n)) => n.as_f64().is_some_and(|b| *a == b),
        (Scalar::Text(a), serde_json::Value::String(b)) => a == b,
        (Scalar::Json(a), b) => a == b,
        _ => false,
    }
}

/// Ordered comparison over numbers or ISO-date-comparable strings.
fn compare(actual: &Scalar, rhs: &serde_json::Value) -> Result<std::cmp::Ordering, String> {
    if let (Some(a), Some(b)) = (scalar_number(actual), value_number(rhs)) {
        return a
            .partial_cmp(&b)
            .ok_or_else(|| "non-finite number in comparison".into());
    }

    if let (Scalar::Text(a), serde_json::Value::String(b)) = (actual, rhs) {
        if let (Some(a), Some(b)) = (parse_instant(a), parse_instant(b)) {
            return Ok(a.cmp(&b));
        }
        return Err(format!("strings {a:?} and {b:?} are not ISO dates"));
    }

    Err(format!(
        "{} is not ordered against {rhs}",
        actual.kind()
    ))
}

fn scalar_number(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::I64(n) => Some(*n as f64),
        Scalar::F64(f) => Some(*f),
        _ => None,
    }
}

fn value_number(value: &serde_json::Value) -> Option<f64> {
    value.as_f64()
}

/// Epoch milliseconds of an RFC 3339 instant or a plain calendar date.
fn parse_instant(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc().timestamp_millis())
}
