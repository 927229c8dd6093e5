//! Wire-shape tests for the shared model types.

use lakesync_core::models::delta::{ColumnValue, DeltaOp, RowDelta, Scalar};
use lakesync_core::models::hlc::HlcTimestamp;
use lakesync_core::models::protocol::{PullResponse, PushResponse};

fn sample() -> RowDelta {
    RowDelta {
        op: DeltaOp::Update,
        table: "todos".into(),
        row_id: "r1".into(),
        client_id: "client-a".into(),
        hlc: HlcTimestamp::from_parts(1_700_000_000_000, 3),
        columns: vec![ColumnValue::new("title", Scalar::Text("x".into()))],
        delta_id: "0123456789abcdef0123456789abcdef".into(),
    }
}

#[test]
fn row_delta_uses_camel_case_field_names() {
    let json = serde_json::to_value(sample()).unwrap();
    assert_eq!(json["op"], "UPDATE");
    assert_eq!(json["rowId"], "r1");
    assert_eq!(json["clientId"], "client-a");
    assert_eq!(json["deltaId"], "0123456789abcdef0123456789abcdef");
    assert_eq!(
        json["hlc"],
        HlcTimestamp::from_parts(1_700_000_000_000, 3).as_u64()
    );
}

#[test]
fn row_delta_round_trips() {
    let delta = sample();
    let json = serde_json::to_string(&delta).unwrap();
    let back: RowDelta = serde_json::from_str(&json).unwrap();
    assert_eq!(back, delta);
}

#[test]
fn push_response_omits_absent_pressure() {
    let response = PushResponse {
        server_hlc: HlcTimestamp::from_parts(1_000, 0),
        accepted: 3,
        buffer_pressure: None,
    };
    let json = serde_json::to_value(&response).unwrap();
    assert!(json.get("bufferPressure").is_none());

    let response = PushResponse {
        buffer_pressure: Some(0.91),
        ..response
    };
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["bufferPressure"], 0.91);
}

#[test]
fn pull_response_round_trips() {
    let response = PullResponse {
        deltas: vec![sample()],
        next_cursor: HlcTimestamp::from_parts(2_000, 1),
        has_more: true,
    };
    let json = serde_json::to_string(&response).unwrap();
    let back: PullResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(back, response);
}
