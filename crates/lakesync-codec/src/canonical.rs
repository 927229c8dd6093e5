//! Canonical JSON rendering of a delta.
//!
//! The output is byte-stable: fixed field order
//! `op, table, rowId, clientId, hlc, columns`, columns sorted by name,
//! object keys inside json values sorted recursively, no insignificant
//! whitespace, numbers in their shortest round-tripping form, the HLC as a
//! decimal string of the packed u64. The `deltaId` field never participates.

use std::fmt::Write as _;

use lakesync_core::models::delta::{RowDelta, Scalar};

/// Render the canonical JSON of a delta, excluding its `deltaId`.
pub fn canonical_json(delta: &RowDelta) -> String {
    let mut out = String::with_capacity(128);
    out.push_str("{\"op\":\"");
    out.push_str(delta.op.as_str());
    out.push_str("\",\"table\":");
    push_string(&mut out, &delta.table);
    out.push_str(",\"rowId\":");
    push_string(&mut out, &delta.row_id);
    out.push_str(",\"clientId\":");
    push_string(&mut out, &delta.client_id);
    // The HLC is a decimal string so 64-bit values survive JSON parsers
    // that truncate large integers.
    let _ = write!(out, ",\"hlc\":\"{}\"", delta.hlc.as_u64());
    out.push_str(",\"columns\":[");

    let mut columns: Vec<_> = delta.columns.iter().collect();
    columns.sort_by(|a, b| a.column.cmp(&b.column));
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str("{\"column\":");
        push_string(&mut out, &col.column);
        out.push_str(",\"value\":");
        push_scalar(&mut out, &col.value);
        out.push('}');
    }
    out.push_str("]}");
    out
}

fn push_string(out: &mut String, s: &str) {
    // serde_json's string rendering is minimal-escape and deterministic.
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => out.push_str("\"\""),
    }
}

fn push_scalar(out: &mut String, value: &Scalar) {
    match value {
        Scalar::Null => out.push_str("null"),
        Scalar::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Scalar::I64(n) => {
            let _ = write!(out, "{n}");
        }
        Scalar::F64(f) => push_f64(out, *f),
        Scalar::Text(s) => push_string(out, s),
        Scalar::Bytes(bytes) => {
            out.push_str("{\"$bytes\":\"");
            for b in bytes {
                let _ = write!(out, "{b:02x}");
            }
            out.push_str("\"}");
        }
        Scalar::Json(v) => {
            out.push_str("{\"$json\":");
            push_value(out, v);
            out.push('}');
        }
    }
}

fn push_f64(out: &mut String, f: f64) {
    // Shortest round-tripping form via serde_json's ryu rendering.
    // Non-finite floats have no JSON form and canonicalise to null.
    match serde_json::Number::from_f64(f) {
        Some(n) => {
            let _ = write!(out, "{n}");
        }
        None => out.push_str("null"),
    }
}

/// Canonical rendering of an arbitrary json value: object keys sorted
/// recursively, everything else as serde_json renders it.
fn push_value(out: &mut String, value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_string(out, key);
                out.push(':');
                push_value(out, &map[*key]);
            }
            out.push('}');
        }
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_value(out, item);
            }
            out.push(']');
        }
        other => {
            let _ = write!(out, "{other}");
        }
    }
}
